//! Server binary for facturx-gateway.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to a `ServiceConfig` and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use facturx_gateway::{server, ServiceConfig, ToolCommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "facturx-gateway",
    version,
    about = "HTTP gateway for e-invoice document tooling (Mustang, Ghostscript, veraPDF)"
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Path to the Mustang CLI jar (launched via `java -jar`).
    #[arg(
        long,
        env = "MUSTANG_JAR",
        default_value = "/opt/mustang/Mustang-CLI-2.16.4.jar"
    )]
    mustang_jar: String,

    /// Ghostscript executable.
    #[arg(long, env = "GS_BIN", default_value = "gs")]
    ghostscript: String,

    /// veraPDF executable.
    #[arg(long, env = "VERAPDF_BIN", default_value = "verapdf")]
    verapdf: String,

    /// Bearer token required on data endpoints. Unset disables auth.
    #[arg(long, env = "GATEWAY_AUTH_TOKEN")]
    auth_token: Option<String>,

    /// Timeout for Mustang validation and diagram generation, in seconds.
    #[arg(long, env = "GATEWAY_MUSTANG_TIMEOUT", default_value_t = 60)]
    mustang_timeout: u64,

    /// Timeout for Ghostscript conversion and XML embedding, in seconds.
    #[arg(long, env = "GATEWAY_CONVERT_TIMEOUT", default_value_t = 120)]
    convert_timeout: u64,

    /// Timeout for a veraPDF conformance run, in seconds.
    #[arg(long, env = "GATEWAY_VERAPDF_TIMEOUT", default_value_t = 60)]
    verapdf_timeout: u64,

    /// Version tag file per tool, as `tool=path` (repeatable).
    /// Tools: mustang, ghostscript, verapdf.
    #[arg(long = "version-tag", value_name = "TOOL=PATH")]
    version_tags: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = ServiceConfig::builder()
        .mustang_jar(&cli.mustang_jar)
        .ghostscript(ToolCommand::bare(&cli.ghostscript))
        .verapdf(ToolCommand::bare(&cli.verapdf))
        .mustang_timeout_secs(cli.mustang_timeout)
        .convert_timeout_secs(cli.convert_timeout)
        .verapdf_timeout_secs(cli.verapdf_timeout);

    if let Some(token) = &cli.auth_token {
        builder = builder.auth_token(token);
    }
    for tag in &cli.version_tags {
        let (tool, path) = tag
            .split_once('=')
            .with_context(|| format!("--version-tag must be TOOL=PATH, got '{tag}'"))?;
        builder = builder.version_tag_file(tool, PathBuf::from(path));
    }

    let config = builder.build()?;

    server::serve(Arc::new(config), cli.bind)
        .await
        .context("server error")
}
