//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that each hop knows where the next hop lives
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Checks are scoped to the components being started, so a router-only
//!   host does not need a gateway password
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::{Component, EndpointConfig, GatekeeperConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate the configuration for the given set of components.
pub fn validate_config(
    config: &GatekeeperConfig,
    components: &[Component],
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for component in components {
        match component {
            Component::Router => validate_router(config, &mut errors),
            Component::Relay => {
                check_bind("relay.bind_address", &config.relay.bind_address, &mut errors);
                check_url("relay.router_url", &config.relay.router_url, &mut errors);
            }
            Component::Gateway => {
                check_bind("gateway.bind_address", &config.gateway.bind_address, &mut errors);
                check_url("gateway.relay_url", &config.gateway.relay_url, &mut errors);
                if config.gateway.password.is_empty() {
                    errors.push(ValidationError::new("gateway.password", "must not be empty"));
                }
                if let Some(tls) = &config.gateway.tls {
                    if tls.cert_path.is_empty() || tls.key_path.is_empty() {
                        errors.push(ValidationError::new(
                            "gateway.tls",
                            "cert_path and key_path are both required",
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_router(config: &GatekeeperConfig, errors: &mut Vec<ValidationError>) {
    check_bind("router.bind_address", &config.router.bind_address, errors);

    if config.cluster.primary.host.trim().is_empty() {
        errors.push(ValidationError::new("cluster.primary.host", "primary endpoint is unset"));
    }
    check_endpoint("cluster.primary", &config.cluster.primary, errors);
    for (i, replica) in config.cluster.replicas.iter().enumerate() {
        let field = format!("cluster.replicas[{}]", i);
        if replica.host.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.host", field), "must not be empty"));
        }
        check_endpoint(&field, replica, errors);
    }

    if !config.router.default_mode.is_settable() {
        errors.push(ValidationError::new(
            "router.default_mode",
            "must be random or lowest_latency",
        ));
    }
    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::new("probe.timeout_secs", "must be greater than 0"));
    }
}

fn check_endpoint(field: &str, endpoint: &EndpointConfig, errors: &mut Vec<ValidationError>) {
    if endpoint.port == 0 {
        errors.push(ValidationError::new(format!("{}.port", field), "must be non-zero"));
    }
}

fn check_bind(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{}'", value)));
    }
}

/// Next-hop URLs are internal and plain HTTP; TLS terminates at the gateway listener.
fn check_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}', next hops are plain http", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}
