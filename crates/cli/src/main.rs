//! `iiif-fetch` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load the optional TOML file and apply the
//!    `--server-url` / `IIIF_IMAGE_SERVER_URL` override (see [`config`]).
//! 2. **Wire observability**: install `tracing-subscriber` with an `EnvFilter`
//!    (`RUST_LOG`, default `info`) writing to stderr, as text or JSON.
//! 3. **Construct infrastructure**: build the reqwest transport and inject it
//!    into the adapter (see [`provider`]).
//! 4. **Run one request**: `image`, `info` or `raw`, streaming the body to
//!    `--output` or stdout. Non-success responses exit with status 1.

mod config;
mod provider;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use iiif::{AdapterResponse, Headers, IiifImageParameters, IiifParameters};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AdapterConfig;

#[derive(Debug, Parser)]
#[command(name = "iiif-fetch")]
#[command(about = "Fetch images and image information from a IIIF image server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "IIIF_ADAPTER_CONFIG")]
    config: Option<PathBuf>,

    /// Image server base URL; overrides the configuration file.
    #[arg(long, env = "IIIF_IMAGE_SERVER_URL")]
    server_url: Option<String>,

    /// Write the response body here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the response summary as JSON.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request an image region/size/rotation/quality/format.
    Image {
        #[arg(long)]
        data_divider: String,
        #[arg(long)]
        identifier: String,
        #[arg(long, default_value = "full")]
        region: String,
        #[arg(long, default_value = "max")]
        size: String,
        #[arg(long, default_value = "0")]
        rotation: String,
        #[arg(long, default_value = "default")]
        quality: String,
        #[arg(long, default_value = "jpg")]
        format: String,
    },
    /// Request the image information document.
    Info {
        #[arg(long)]
        data_divider: String,
        #[arg(long)]
        identifier: String,
    },
    /// Forward an arbitrary request path with the given method and headers.
    Raw {
        /// Path appended verbatim to the server URL.
        uri: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// `Name: value`, repeatable; order is preserved.
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = AdapterConfig::load(cli.config.as_deref(), cli.server_url.clone())
        .context("loading adapter configuration")?;
    let adapter = provider::build_adapter(&config)?;

    let response = match &cli.command {
        Command::Image {
            data_divider,
            identifier,
            region,
            size,
            rotation,
            quality,
            format,
        } => {
            let params = IiifImageParameters::new(
                data_divider,
                identifier,
                region,
                size,
                rotation,
                quality,
                format,
            );
            adapter.request_image(&params).await?
        }
        Command::Info {
            data_divider,
            identifier,
        } => adapter.request_information(data_divider, identifier).await?,
        Command::Raw {
            uri,
            method,
            headers,
        } => {
            let headers: Headers = headers.iter().cloned().collect();
            adapter
                .call_iiif_server(&IiifParameters::new(uri, method, headers))
                .await?
        }
    };

    report(&response, cli.json)?;
    let success = response.is_success();
    write_body(response, cli.output.as_deref()).await?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Prints status, headers and error message to stderr.
fn report(response: &AdapterResponse, json: bool) -> Result<()> {
    if json {
        let summary = serde_json::json!({
            "status": response.status(),
            "headers": response.headers(),
            "error_message": response.error_message(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    eprintln!("status: {}", response.status());
    for (name, value) in response.headers().iter() {
        eprintln!("{name}: {value}");
    }
    if let Some(message) = response.error_message() {
        eprintln!("error: {message}");
    }
    Ok(())
}

/// Streams the body, if any, to `output` or stdout.
async fn write_body(response: AdapterResponse, output: Option<&std::path::Path>) -> Result<()> {
    let Some(body) = response.into_body() else {
        return Ok(());
    };

    let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("creating '{}'", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    let mut written = 0usize;
    let mut stream = body.into_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("reading response body")?;
        writer.write_all(&chunk).await?;
        written += chunk.len();
    }
    writer.flush().await?;
    info!(bytes = written, "Response body written");
    Ok(())
}
