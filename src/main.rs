//! Jail front-end.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────┐
//!                   │                 jail-proxy                   │
//!   client ─────────┼─▶ listener ─▶ admission ─▶ challenge/verify  │
//!                   │                                   │          │
//!                   │                                   ▼          │
//!   client ◀────────┼──────────────── relay ◀──▶ backend (port+1) ─┼── sandbox
//!                   │                                              │
//!                   │   supervisor ── fatal channel ── exit        │
//!                   └──────────────────────────────────────────────┘
//! ```
//!
//! With `JAIL_POW=0` there is no proxy: the backend listens on the public
//! port and this process only supervises it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use jail_proxy::config::loader::{load_config, load_from_env};
use jail_proxy::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "jail-proxy")]
#[command(about = "Proof-of-work gate in front of a sandboxed TCP service", long_about = None)]
struct Cli {
    /// TOML configuration file. JAIL_* environment variables override it.
    #[arg(short, long, env = "JAIL_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("load config {}", path.display()))?,
        None => load_from_env().context("load config from environment")?,
    };
    init_logging(&config.observability);

    tracing::info!(
        port = config.listener.port,
        difficulty = config.pow.difficulty,
        max_connections = config.limits.max_connections,
        max_connections_per_ip = config.limits.max_connections_per_ip,
        "Configuration loaded"
    );

    jail_proxy::lifecycle::run(config, cli.config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
