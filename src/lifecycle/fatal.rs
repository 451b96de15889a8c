//! Process-level fatal error conduit.
//!
//! A single-slot channel written by whichever infrastructure component fails
//! first (front listener, backend dial, backend supervisor). The process
//! reads it once and exits.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::net::listener::ListenerError;

/// Unrecoverable infrastructure failure.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("front listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("dial backend {addr}: {source}")]
    BackendDial {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("spawn backend {program}: {source}")]
    BackendSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("wait for backend: {0}")]
    BackendWait(#[source] io::Error),

    #[error("backend exited: {0}")]
    BackendExited(ExitStatus),
}

/// Create the conduit. Only the first reported error is kept.
pub fn fatal_channel() -> (FatalSender, FatalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (FatalSender(tx), FatalReceiver(rx))
}

#[derive(Debug, Clone)]
pub struct FatalSender(mpsc::Sender<FatalError>);

impl FatalSender {
    /// Report a fatal error without waiting. Later reports are logged and dropped.
    pub fn report(&self, error: FatalError) {
        tracing::error!(error = %error, "Fatal infrastructure error");
        if let Err(mpsc::error::TrySendError::Full(dropped)) = self.0.try_send(error) {
            tracing::debug!(error = %dropped, "Fatal error already pending, dropping");
        }
    }
}

#[derive(Debug)]
pub struct FatalReceiver(mpsc::Receiver<FatalError>);

impl FatalReceiver {
    /// Wait for the first fatal error. `None` once every sender is gone.
    pub async fn wait(mut self) -> Option<FatalError> {
        self.0.recv().await
    }
}
