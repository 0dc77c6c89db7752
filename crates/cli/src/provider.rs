//! Instance provider: turns a validated [`AdapterConfig`] into a wired adapter.

use anyhow::{Context, Result};
use iiif::{IiifAdapter, NotFoundPolicy};
use tracing::info;
use transport::{ReqwestTransport, TransportConfig};

use crate::config::AdapterConfig;

/// Builds the reqwest transport and the adapter for `config`.
pub fn build_adapter(config: &AdapterConfig) -> Result<IiifAdapter<ReqwestTransport>> {
    let transport = ReqwestTransport::new(&TransportConfig {
        timeout: config.timeout(),
        ..TransportConfig::default()
    })
    .context("constructing HTTP transport")?;

    let policy = not_found_policy(config)?;
    info!(
        image_server_url = %config.image_server_url,
        not_found_policy = ?policy,
        "IIIF adapter ready"
    );
    Ok(IiifAdapter::new(config.image_server_url.clone(), transport).with_not_found_policy(policy))
}

/// Selects the not-found policy from `config`.
pub fn not_found_policy(config: &AdapterConfig) -> Result<NotFoundPolicy> {
    if !config.not_found_body {
        return Ok(NotFoundPolicy::ErrorOnly);
    }
    let charset = config
        .charset()
        .with_context(|| format!("selecting body encoding '{}'", config.body_encoding))?;
    Ok(NotFoundPolicy::fallback_body(charset))
}
