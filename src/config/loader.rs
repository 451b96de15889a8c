//! Configuration loading from disk and the jail environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_PORT: &str = "JAIL_PORT";
pub const ENV_POW: &str = "JAIL_POW";
pub const ENV_CONNS: &str = "JAIL_CONNS";
pub const ENV_CONNS_PER_IP: &str = "JAIL_CONNS_PER_IP";
pub const ENV_BACKEND_CMD: &str = "JAIL_BACKEND_CMD";

/// Load a TOML file, overlay the process environment, and validate.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ProxyConfig = toml::from_str(&content)?;
    apply_env(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults overlaid with the process environment, validated.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    let mut config = ProxyConfig::default();
    apply_env(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `JAIL_*` variables onto `config`. Unrelated variables are ignored.
pub fn apply_env<I>(config: &mut ProxyConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        match key.as_str() {
            ENV_PORT => config.listener.port = parse_var(ENV_PORT, &value)?,
            ENV_POW => config.pow.difficulty = parse_var(ENV_POW, &value)?,
            ENV_CONNS => config.limits.max_connections = parse_var(ENV_CONNS, &value)?,
            ENV_CONNS_PER_IP => {
                config.limits.max_connections_per_ip = parse_var(ENV_CONNS_PER_IP, &value)?
            }
            ENV_BACKEND_CMD => {
                config.backend.command = value.split_whitespace().map(String::from).collect()
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    let trimmed = value.trim();
    // an empty variable means "unset"
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };
    trimmed.parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = ProxyConfig::default();
        apply_env(
            &mut config,
            vars(&[
                ("JAIL_PORT", "7000"),
                ("JAIL_POW", "1337"),
                ("JAIL_CONNS", "50"),
                ("JAIL_CONNS_PER_IP", "2"),
                ("JAIL_BACKEND_CMD", "/bin/app  --flag"),
                ("PATH", "/usr/bin"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 7000);
        assert_eq!(config.pow.difficulty, 1337);
        assert_eq!(config.limits.max_connections, 50);
        assert_eq!(config.limits.max_connections_per_ip, 2);
        assert_eq!(config.backend.command, vec!["/bin/app", "--flag"]);
    }

    #[test]
    fn per_ip_cap_above_total_is_accepted() {
        let mut config = ProxyConfig::default();
        apply_env(
            &mut config,
            vars(&[("JAIL_CONNS", "1"), ("JAIL_CONNS_PER_IP", "2")]),
        )
        .unwrap();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn bad_env_value_names_variable() {
        let mut config = ProxyConfig::default();
        let err = apply_env(&mut config, vars(&[("JAIL_POW", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "JAIL_POW", .. }));
    }

    #[test]
    fn empty_backend_cmd_disables_supervision() {
        let mut config = ProxyConfig::default();
        apply_env(&mut config, vars(&[("JAIL_BACKEND_CMD", ""), ("JAIL_CONNS", "")])).unwrap();
        assert!(config.backend.command.is_empty());
        assert_eq!(config.limits.max_connections, 0);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[listener]\nport = 6000\n\n[pow]\ndifficulty = 5\n\n[backend]\ncommand = []"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        // the test environment has no JAIL_* variables set
        assert_eq!(config.listener.port, 6000);
        assert_eq!(config.pow.difficulty, 5);
        assert!(config.backend.command.is_empty());
    }

    #[test]
    fn invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nport = 0").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener\nport = 1").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
