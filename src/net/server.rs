//! Accept loop and connection dispatch.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::ProxySettings;
use crate::lifecycle::fatal::{FatalError, FatalSender};
use crate::lifecycle::ShutdownSignal;
use crate::net::connection::ConnectionHandler;
use crate::net::listener::Listener;
use crate::observability::metrics;
use crate::security::AdmissionController;

/// The proof-of-work proxy in front of the backend.
pub struct ProxyServer {
    admission: Arc<AdmissionController>,
    settings: Arc<ArcSwap<ProxySettings>>,
    backend_addr: Arc<str>,
    fatal: FatalSender,
}

impl ProxyServer {
    pub fn new(
        backend_addr: impl Into<Arc<str>>,
        settings: Arc<ArcSwap<ProxySettings>>,
        fatal: FatalSender,
    ) -> Self {
        Self {
            admission: Arc::new(AdmissionController::new()),
            settings,
            backend_addr: backend_addr.into(),
            fatal,
        }
    }

    /// Shared admission state, for inspection.
    pub fn admission(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.admission)
    }

    /// Bind `addr` and run. A bind failure is reported as fatal.
    pub async fn serve(self, addr: String, shutdown: ShutdownSignal) {
        match Listener::bind(&addr).await {
            Ok(listener) => self.run(listener, shutdown).await,
            Err(e) => self.fatal.report(FatalError::Listener(e)),
        }
    }

    /// Accept until shutdown. Accept errors are logged and retried immediately.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) {
        tracing::info!(backend = %self.backend_addr, "Proxy accepting connections");

        loop {
            let accepted = tokio::select! {
                _ = shutdown.wait() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let handler = ConnectionHandler::new(
                        Arc::clone(&self.admission),
                        **self.settings.load(),
                        Arc::clone(&self.backend_addr),
                        self.fatal.clone(),
                    );
                    tracing::trace!(id = %handler.id(), %peer, "Dispatching");
                    tokio::spawn(handler.run(stream));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    metrics::record_accept_error();
                }
            }
        }

        tracing::info!("Proxy stopped accepting");
    }
}
