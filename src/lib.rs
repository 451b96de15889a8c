//! Proof-of-work front-end for a sandboxed TCP service.
//!
//! Clients must solve a sequential modular square-root puzzle before their
//! connection is relayed to the backend, which runs under the jail's
//! resource and syscall restrictions on a local port.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pow;
pub mod security;

pub use config::ProxyConfig;
pub use lifecycle::{FatalError, Shutdown};
pub use net::ProxyServer;
pub use pow::{Challenge, Solution};
