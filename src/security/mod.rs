//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted connection:
//!     → admission.rs (total and per-IP caps)
//!     → proof of work (see `pow`)
//!     → forwarded to the backend
//! ```
//!
//! # Design Decisions
//! - Fail closed: a connection that cannot be admitted is dropped silently
//! - No trust in client input: answers are read under a hard byte cap

pub mod admission;

pub use admission::{AdmissionController, AdmissionGuard};
