//! HTTP transport infrastructure for the IIIF adapter.
//!
//! Implements the [`iiif::HttpTransport`] port with [`reqwest`]. The [`iiif`]
//! crate sees only the port; URL parsing, header validation, connection
//! handling and body streaming live here.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain classification rules. It
//! reports whatever status the server sent; the adapter decides what it means.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use iiif::{Headers, HttpTransport, ResponseBody, TransportError, TransportRequest, TransportResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Url};
use thiserror::Error;
use tracing::{debug, trace};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("iiif-adapter/", env!("CARGO_PKG_VERSION"));

/// Settings for the underlying HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Total request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
#[error("Failed to build HTTP client")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// [`HttpTransport`] backed by a shared [`reqwest::Client`].
///
/// Cloning is cheap; clones share the client's connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport from `config`.
    ///
    /// Redirects are never followed: a 3xx reply is returned as-is, so each
    /// `send` is exactly one request on the wire.
    pub fn new(config: &TransportConfig) -> Result<Self, ClientBuildError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let TransportRequest {
            url,
            method,
            headers,
        } = request;

        let target = Url::parse(&url).map_err(|e| TransportError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let http_method = Method::from_bytes(method.as_bytes())
            .map_err(|_| TransportError::InvalidMethod { method: method.clone() })?;

        let mut builder = self.client.request(http_method, target);
        for (name, value) in headers.iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                TransportError::InvalidHeader {
                    name: name.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader {
                    name: name.to_string(),
                })?;
            builder = builder.header(header_name, header_value);
        }

        trace!(%url, %method, header_count = headers.len(), "Sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                source: Box::new(e),
            })?;

        let status = response.status().as_u16();
        let response_headers = collect_headers(response.headers());
        debug!(%url, status, "Received response");

        let body = ResponseBody::from_stream(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| TransportError::Body {
                source: Box::new(e),
            })
        }));

        Ok(TransportResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

/// Flattens a [`HeaderMap`], joining repeated values with `", "`.
fn collect_headers(map: &HeaderMap) -> Headers {
    map.keys()
        .map(|name| {
            let joined = map
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}
