//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use crate::config::schema::{default_db_port, Component, EndpointConfig, GatekeeperConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::RoutingMode;

/// Environment variables that override file values.
pub const ENV_PRIMARY: &str = "GATEKEEPER_PRIMARY";
pub const ENV_REPLICAS: &str = "GATEKEEPER_REPLICAS";
pub const ENV_DB_USER: &str = "GATEKEEPER_DB_USER";
pub const ENV_DB_PASSWORD: &str = "GATEKEEPER_DB_PASSWORD";
pub const ENV_DB_NAME: &str = "GATEKEEPER_DB_NAME";
pub const ENV_GATEWAY_PASSWORD: &str = "GATEKEEPER_GATEWAY_PASSWORD";
pub const ENV_RELAY_URL: &str = "GATEKEEPER_RELAY_URL";
pub const ENV_ROUTER_URL: &str = "GATEKEEPER_ROUTER_URL";
pub const ENV_DEFAULT_MODE: &str = "GATEKEEPER_DEFAULT_MODE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration, apply environment overrides, and validate it for
/// the components about to start.
///
/// Without a path the defaults are used as the base.
pub fn load_config(
    path: Option<&Path>,
    components: &[Component],
) -> Result<GatekeeperConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatekeeperConfig::default(),
    };

    apply_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config, components).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides from a variable lookup (the process environment in production).
pub fn apply_overrides<F>(config: &mut GatekeeperConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_PRIMARY) {
        config.cluster.primary = parse_endpoint(&raw).map_err(|message| ConfigError::Env {
            var: ENV_PRIMARY,
            message,
        })?;
    }

    if let Some(raw) = lookup(ENV_REPLICAS) {
        config.cluster.replicas = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_endpoint)
            .collect::<Result<Vec<_>, String>>()
            .map_err(|message| ConfigError::Env { var: ENV_REPLICAS, message })?;
    }

    if let Some(mode) = lookup(ENV_DEFAULT_MODE) {
        config.router.default_mode = mode.parse::<RoutingMode>().map_err(|e| ConfigError::Env {
            var: ENV_DEFAULT_MODE,
            message: e.to_string(),
        })?;
    }

    if let Some(v) = lookup(ENV_DB_USER) { config.database.user = v; }
    if let Some(v) = lookup(ENV_DB_PASSWORD) { config.database.password = v; }
    if let Some(v) = lookup(ENV_DB_NAME) { config.database.name = v; }
    if let Some(v) = lookup(ENV_GATEWAY_PASSWORD) { config.gateway.password = v; }
    if let Some(v) = lookup(ENV_RELAY_URL) { config.gateway.relay_url = v; }
    if let Some(v) = lookup(ENV_ROUTER_URL) { config.relay.router_url = v; }

    Ok(())
}

/// Parse `host` or `host:port`.
fn parse_endpoint(raw: &str) -> Result<EndpointConfig, String> {
    let raw = raw.trim();
    let (host, port) = match raw.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid port in '{}'", raw))?;
            (host, port)
        }
        None => (raw, default_db_port()),
    };

    if host.is_empty() {
        return Err(format!("missing host in '{}'", raw));
    }

    Ok(EndpointConfig {
        host: host.to_string(),
        port,
    })
}
