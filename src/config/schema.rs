//! Configuration schema definitions.
//!
//! All sections derive Serde traits and default every field, so an empty
//! file (or no file at all) yields the jail's stock settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the jail front-end.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Public listener.
    pub listener: ListenerConfig,

    /// Puzzle settings.
    pub pow: PowConfig,

    /// Connection caps.
    pub limits: LimitsConfig,

    /// Sandboxed backend.
    pub backend: BackendConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// The puzzle layer only runs with a non-zero difficulty. Otherwise the
    /// backend owns the public port and clients connect to it directly.
    pub fn proxy_enabled(&self) -> bool {
        self.pow.difficulty > 0
    }

    /// Port the backend listens on.
    pub fn backend_port(&self) -> u16 {
        if self.proxy_enabled() {
            self.listener.port.saturating_add(1)
        } else {
            self.listener.port
        }
    }

    pub fn front_address(&self) -> String {
        format!("{}:{}", self.listener.bind_host, self.listener.port)
    }

    pub fn backend_address(&self) -> String {
        format!("{}:{}", self.backend.host, self.backend_port())
    }

    /// Settings that can change while the proxy is running.
    pub fn settings(&self) -> ProxySettings {
        ProxySettings {
            difficulty: self.pow.difficulty,
            max_connections: self.limits.max_connections,
            max_connections_per_ip: self.limits.max_connections_per_ip,
            solution_timeout: match self.timeouts.solution_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Public port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PowConfig {
    /// Sequential rounds per challenge. 0 disables the puzzle layer.
    pub difficulty: u32,
}

/// Open-connection caps. 0 means unlimited.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum concurrently open connections.
    pub max_connections: u32,

    /// Maximum concurrently open connections from one source IP.
    pub max_connections_per_ip: u32,
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Host the backend is bound to.
    pub host: String,

    /// Command that runs the sandboxed backend. Empty if something else
    /// supervises it.
    pub command: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            command: vec![
                "/jail/nsjail".to_string(),
                "-C".to_string(),
                "/tmp/nsjail.cfg".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed between the banner and the solution line, in seconds.
    /// 0 waits indefinitely.
    pub solution_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Runtime-adjustable proxy settings, swapped atomically on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxySettings {
    pub difficulty: u32,
    pub max_connections: u32,
    pub max_connections_per_ip: u32,
    pub solution_timeout: Option<Duration>,
}
