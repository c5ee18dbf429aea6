//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for all three
//! components. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::RoutingMode;

/// A component of the request chain that this process can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Router,
    Relay,
    Gateway,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Router => "router",
            Component::Relay => "relay",
            Component::Gateway => "gateway",
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for the gatekeeper tier.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Router listener and default routing mode.
    pub router: RouterConfig,

    /// Latency probe settings for lowest-latency routing.
    pub probe: ProbeConfig,

    /// Primary and replica endpoints.
    pub cluster: ClusterConfig,

    /// Credentials the router uses against the database.
    pub database: DatabaseConfig,

    /// Internal relay settings.
    pub relay: RelayConfig,

    /// External gateway settings.
    pub gateway: GatewayConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

/// Router listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Routing mode in effect at startup (and after every restart).
    pub default_mode: RoutingMode,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            default_mode: RoutingMode::Random,
        }
    }
}

/// How a replica's liveness is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// TCP connect to the replica's database port.
    Tcp,
    /// HTTP GET against the replica host.
    Http,
}

/// Latency probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub kind: ProbeKind,

    /// Per-replica probe timeout in seconds.
    pub timeout_secs: u64,

    /// Port used by HTTP probes.
    pub http_port: u16,

    /// Path used by HTTP probes.
    pub http_path: String,

    /// Probe all replicas at once instead of one at a time.
    pub concurrent: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: ProbeKind::Tcp,
            timeout_secs: 5,
            http_port: 80,
            http_path: "/".to_string(),
            concurrent: false,
        }
    }
}

/// Cluster topology.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    /// The single writable endpoint.
    pub primary: EndpointConfig,

    /// Read-only endpoints, in selection tie-break order.
    pub replicas: Vec<EndpointConfig>,
}

/// A database endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_db_port(),
        }
    }
}

pub(crate) fn default_db_port() -> u16 {
    3306
}

/// Database credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// Schema selected on every connection.
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            password: String::new(),
            name: "sakila".to_string(),
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind_address: String,

    /// Base URL of the router ingress.
    pub router_url: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
            router_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind_address: String,

    /// Base URL of the relay.
    pub relay_url: String,

    /// Shared secret expected in the `X-Gatekeeper-Password` header.
    pub password: String,

    /// Optional TLS configuration for the external listener.
    pub tls: Option<TlsConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            relay_url: "http://127.0.0.1:5001".to_string(),
            password: String::new(),
            tls: None,
        }
    }
}

/// TLS configuration for the gateway listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening applied on every hop.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}
