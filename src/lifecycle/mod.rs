//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → backend supervisor → front listener → wait
//!
//! Fatal errors (fatal.rs):
//!     listener bind / backend dial / backend exit → single-slot conduit → exit 1
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop accepting → exit 0
//! ```

pub mod fatal;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use fatal::{fatal_channel, FatalError, FatalReceiver, FatalSender};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::run;
