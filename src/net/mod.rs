//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → server.rs (spawn one handler per connection)
//!     → connection.rs (admission, challenge, verification)
//!     → solution.rs (bounded read of the answer)
//!     → relay.rs (bidirectional copy to the backend)
//! ```
//!
//! # Design Decisions
//! - One task per connection; a failing handler never affects others
//! - Backend dial failure is an infrastructure fault, reported as fatal
//! - Settings are snapshotted per connection, so reloads apply to new clients

pub mod connection;
pub mod listener;
pub mod relay;
pub mod server;
pub mod solution;

pub use connection::{ConnectionHandler, ConnectionId, Outcome};
pub use listener::{Listener, ListenerError};
pub use server::ProxyServer;
