//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay JAIL_* environment)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → apply_reload swaps ProxySettings (difficulty, caps)
//!     → new connections observe the new settings
//! ```
//!
//! # Design Decisions
//! - The environment wins over the file, matching how the jail is deployed
//! - All fields have defaults to allow minimal configs
//! - Only per-connection settings are hot-reloadable

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::{
    BackendConfig, ListenerConfig, LimitsConfig, LogFormat, ObservabilityConfig, PowConfig,
    ProxyConfig, ProxySettings, TimeoutConfig,
};
