//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the backend supervisor when a command is configured
//! - Bind the front listener when proof of work is enabled
//! - Start metrics and config reload
//! - Wait for the first fatal error or a termination signal
//!
//! # Design Decisions
//! - Fail fast: the first fatal error ends the process
//! - With difficulty 0 there is no proxy; the backend owns the public port

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::watcher::{apply_reload, ConfigWatcher};
use crate::config::{ProxyConfig, ProxySettings};
use crate::lifecycle::fatal::{fatal_channel, FatalError};
use crate::lifecycle::signals::wait_for_termination;
use crate::lifecycle::supervisor::BackendSupervisor;
use crate::lifecycle::Shutdown;
use crate::net::ProxyServer;
use crate::observability::metrics;

/// Run the jail front-end until a fatal error or termination signal.
pub async fn run(config: ProxyConfig, config_path: Option<PathBuf>) -> Result<(), FatalError> {
    let (fatal_tx, fatal_rx) = fatal_channel();
    let shutdown = Shutdown::new();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let _backend = match BackendSupervisor::from_command(&config.backend.command) {
        Some(supervisor) => Some(supervisor.spawn(fatal_tx.clone())),
        None => {
            tracing::info!(address = %config.backend_address(), "Backend supervised externally");
            None
        }
    };

    let mut _watcher = None;
    if config.proxy_enabled() {
        let settings = Arc::new(ArcSwap::from_pointee(config.settings()));
        if let Some(path) = config_path {
            _watcher = start_reload(path, config.clone(), Arc::clone(&settings));
        }

        let server = ProxyServer::new(config.backend_address(), settings, fatal_tx.clone());
        tokio::spawn(server.serve(config.front_address(), shutdown.signal()));
    } else {
        tracing::info!(
            port = config.listener.port,
            "Proof of work disabled, clients connect to the backend directly"
        );
    }
    drop(fatal_tx);

    tokio::select! {
        fatal = fatal_rx.wait() => {
            shutdown.trigger();
            match fatal {
                Some(error) => Err(error),
                None => {
                    tracing::info!("Nothing left to run");
                    Ok(())
                }
            }
        }
        _ = wait_for_termination() => {
            shutdown.trigger();
            Ok(())
        }
    }
}

fn start_reload(
    path: PathBuf,
    active: ProxyConfig,
    settings: Arc<ArcSwap<ProxySettings>>,
) -> Option<notify::RecommendedWatcher> {
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let watcher = match watcher.run() {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Config reload disabled");
            return None;
        }
    };

    tokio::spawn(async move {
        while let Some(next) = updates.recv().await {
            apply_reload(&active, &next, &settings);
        }
    });
    Some(watcher)
}
