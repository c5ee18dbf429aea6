//! Backend endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single database endpoint
//! - Record whether it is the primary or a replica

use serde::{Deserialize, Serialize};

use crate::config::EndpointConfig;

/// Role of an endpoint in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Primary,
    Replica,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Replica => "replica",
        }
    }
}

/// A single database endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendEndpoint {
    pub role: Role,
    pub host: String,
    pub port: u16,
}

impl BackendEndpoint {
    pub fn new(role: Role, host: impl Into<String>, port: u16) -> Self {
        Self {
            role,
            host: host.into(),
            port,
        }
    }

    pub fn primary(host: impl Into<String>, port: u16) -> Self {
        Self::new(Role::Primary, host, port)
    }

    pub fn replica(host: impl Into<String>, port: u16) -> Self {
        Self::new(Role::Replica, host, port)
    }

    pub(crate) fn from_config(role: Role, config: &EndpointConfig) -> Self {
        Self::new(role, config.host.trim(), config.port)
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }
}

impl std::fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
