//! # hooktap
//!
//! Webhook capture server binary: loads settings, starts logging and
//! metrics, then serves until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use hooktap_core::logging::{self, LogFormat};
use hooktap_server::{HooktapServer, ServerConfig};
use hooktap_settings::HooktapSettings;

/// Capture inbound webhooks and watch them live.
#[derive(Parser, Debug)]
#[command(name = "hooktap", version, about = "Webhook capture server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default `~/.hooktap/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level or `RUST_LOG`-style filter (overrides settings).
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: `compact` or `json` (overrides settings).
    #[arg(long)]
    log_format: Option<String>,
}

impl Cli {
    fn apply(&self, settings: &mut HooktapSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            settings.logging.format.clone_from(format);
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<HooktapSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(hooktap_settings::settings_path);
    let mut settings = hooktap_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid settings after CLI overrides")?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let format = LogFormat::parse(&settings.logging.format)
        .ok_or_else(|| anyhow!("unknown log format {:?}", settings.logging.format))?;
    logging::init(&settings.logging.level, format);

    let metrics = hooktap_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;

    let config = ServerConfig::from(&settings.server);
    let server = HooktapServer::new(config, metrics);
    let handle = server.listen().await.with_context(|| {
        format!(
            "Failed to bind {}:{}",
            settings.server.host, settings.server.port
        )
    })?;
    tracing::info!(
        addr = %handle.addr,
        version = hooktap_core::constants::VERSION,
        "hooktap ready: POST to /webhook, watch at /ui"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server
        .shutdown()
        .graceful_shutdown(handle.into_tasks(), None)
        .await;
    tracing::info!("Shutdown complete");
    Ok(())
}
