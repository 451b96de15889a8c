//! Per-connection state machine.
//!
//! ```text
//! Accepted → AdmissionChecked → PuzzleIssued → AwaitingSolution
//!     → Verified → Forwarding → Closed
//!     → Rejected → Closed
//! ```
//!
//! Every early exit drops the admission guard, so an admitted connection
//! releases its slot exactly once whatever path it takes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::config::ProxySettings;
use crate::lifecycle::fatal::{FatalError, FatalSender};
use crate::net::relay::relay;
use crate::net::solution::{read_solution, SolutionRead};
use crate::observability::metrics;
use crate::pow::Challenge;
use crate::security::AdmissionController;

/// Sent to a client whose solution is wrong or malformed.
pub const REJECTION: &[u8] = b"incorrect proof of work\n";

static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The socket had no usable peer address.
    NoPeerAddress,
    /// Total or per-IP cap reached.
    AdmissionRejected,
    /// The client closed before sending a solution line.
    Disconnected,
    /// No newline within the read cap.
    SolutionTooLong,
    /// No solution line before the configured deadline.
    SolutionTimeout,
    /// Wrong or malformed solution.
    PuzzleFailed,
    /// The backend refused the connection.
    BackendUnavailable,
    /// Read or write failure on either socket.
    PeerIo,
    /// Relayed until one side closed.
    Forwarded,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::NoPeerAddress => "no_peer_address",
            Outcome::AdmissionRejected => "admission_rejected",
            Outcome::Disconnected => "disconnected",
            Outcome::SolutionTooLong => "solution_too_long",
            Outcome::SolutionTimeout => "solution_timeout",
            Outcome::PuzzleFailed => "puzzle_failed",
            Outcome::BackendUnavailable => "backend_unavailable",
            Outcome::PeerIo => "peer_io",
            Outcome::Forwarded => "forwarded",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Banner sent on connect: instructions plus the encoded challenge, then the prompt.
pub fn banner(challenge: &Challenge) -> String {
    format!("proof of work: curl -sSfL https://pwn.red/pow | sh -s {challenge}\nsolution: ")
}

/// Handles one accepted socket from admission to close.
pub struct ConnectionHandler {
    id: ConnectionId,
    admission: Arc<AdmissionController>,
    settings: ProxySettings,
    backend_addr: Arc<str>,
    fatal: FatalSender,
}

impl ConnectionHandler {
    pub fn new(
        admission: Arc<AdmissionController>,
        settings: ProxySettings,
        backend_addr: Arc<str>,
        fatal: FatalSender,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            admission,
            settings,
            backend_addr,
            fatal,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn run(self, client: TcpStream) -> Outcome {
        let span = tracing::info_span!("connection", id = %self.id);
        async move {
            let outcome = self.handle(client).await;
            tracing::info!(%outcome, "close");
            metrics::record_connection(outcome.as_str());
            outcome
        }
        .instrument(span)
        .await
    }

    async fn handle(&self, mut client: TcpStream) -> Outcome {
        let peer = match client.peer_addr() {
            Ok(peer) => peer,
            Err(e) => {
                tracing::debug!(error = %e, "No peer address");
                return Outcome::NoPeerAddress;
            }
        };
        tracing::info!(%peer, "connect");

        let ip = peer.ip().to_canonical();
        let Some(_slot) = self.admission.admit(
            ip,
            self.settings.max_connections,
            self.settings.max_connections_per_ip,
        ) else {
            tracing::info!(%peer, "limit reached");
            return Outcome::AdmissionRejected;
        };

        let challenge = Challenge::generate(self.settings.difficulty);
        tracing::debug!(difficulty = challenge.difficulty(), "Challenge issued");
        if let Err(e) = client.write_all(banner(&challenge).as_bytes()).await {
            tracing::debug!(error = %e, "Banner write failed");
            return Outcome::PeerIo;
        }

        let (line, pipelined) =
            match read_solution(&mut client, self.settings.solution_timeout).await {
                Ok(SolutionRead::Line { line, pipelined }) => (line, pipelined),
                Ok(SolutionRead::TooLong) => return Outcome::SolutionTooLong,
                Ok(SolutionRead::Disconnected) => return Outcome::Disconnected,
                Ok(SolutionRead::TimedOut) => return Outcome::SolutionTimeout,
                Err(e) => {
                    tracing::debug!(error = %e, "Solution read failed");
                    return Outcome::PeerIo;
                }
            };

        if !verify(challenge, line).await {
            tracing::info!(%peer, "bad pow");
            let _ = client.write_all(REJECTION).await;
            return Outcome::PuzzleFailed;
        }

        tracing::info!(%peer, "forwarding");
        let backend = match TcpStream::connect(&*self.backend_addr).await {
            Ok(backend) => backend,
            Err(source) => {
                self.fatal.report(FatalError::BackendDial {
                    addr: self.backend_addr.to_string(),
                    source,
                });
                return Outcome::BackendUnavailable;
            }
        };

        match relay(client, backend, &pipelined, self.id).await {
            Ok(direction) => {
                tracing::debug!(?direction, "Relay finished");
                Outcome::Forwarded
            }
            Err(e) => {
                tracing::debug!(error = %e, "Pipelined write failed");
                Outcome::PeerIo
            }
        }
    }
}

/// Check the solution off the async workers; verification cost grows with difficulty.
async fn verify(challenge: Challenge, line: String) -> bool {
    let started = Instant::now();
    let verdict =
        tokio::task::spawn_blocking(move || challenge.check(line.trim())).await;
    metrics::record_verify(started);

    match verdict {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Malformed solution");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Verification task failed");
            false
        }
    }
}
