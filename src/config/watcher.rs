//! Configuration file watcher for hot reload.
//!
//! Only difficulty, connection caps and the solution timeout can change
//! while running. Ports, the backend command, and switching the puzzle layer
//! on or off all need a restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Watches the configuration file and sends every successfully loaded version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(config) => {
                            let _ = tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Config reload failed, keeping current settings");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Result of applying a reloaded configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Runtime settings were swapped in.
    Applied,
    /// Nothing that can change at runtime changed.
    Unchanged,
    /// The new file would toggle the puzzle layer; ignored.
    Rejected,
}

/// Swap runtime settings from `next` into `settings`.
pub fn apply_reload(
    active: &ProxyConfig,
    next: &ProxyConfig,
    settings: &ArcSwap<crate::config::ProxySettings>,
) -> ReloadOutcome {
    if active.proxy_enabled() != next.proxy_enabled() {
        tracing::warn!(
            active_difficulty = active.pow.difficulty,
            new_difficulty = next.pow.difficulty,
            "Enabling or disabling proof of work requires a restart"
        );
        return ReloadOutcome::Rejected;
    }

    if active.listener != next.listener || active.backend != next.backend {
        tracing::warn!("Listener and backend changes require a restart; ignoring them");
    }

    let new_settings = next.settings();
    if **settings.load() == new_settings {
        return ReloadOutcome::Unchanged;
    }

    tracing::info!(
        difficulty = new_settings.difficulty,
        max_connections = new_settings.max_connections,
        max_connections_per_ip = new_settings.max_connections_per_ip,
        "Proxy settings reloaded"
    );
    settings.store(std::sync::Arc::new(new_settings));
    ReloadOutcome::Applied
}
