//! Backend pool.
//!
//! # Responsibilities
//! - Hold the primary and the ordered replica list
//! - Built once at startup; no add/remove/eviction afterwards
//!
//! Replica order is configuration order and is the tie-break for
//! latency-based selection.

use crate::config::ClusterConfig;
use crate::config::validation::ValidationError;
use crate::load_balancer::backend::{BackendEndpoint, Role};

/// Registry of one primary and zero or more replicas.
#[derive(Debug, Clone)]
pub struct BackendPool {
    primary: BackendEndpoint,
    replicas: Vec<BackendEndpoint>,
}

impl BackendPool {
    /// Create a pool from already-built endpoints.
    pub fn new(primary: BackendEndpoint, replicas: Vec<BackendEndpoint>) -> Self {
        Self { primary, replicas }
    }

    /// Build the pool from configuration. Fails if the primary is unset.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, ValidationError> {
        if config.primary.host.trim().is_empty() {
            return Err(ValidationError {
                field: "cluster.primary.host".to_string(),
                message: "primary endpoint is unset".to_string(),
            });
        }

        let primary = BackendEndpoint::from_config(Role::Primary, &config.primary);
        let replicas: Vec<_> = config
            .replicas
            .iter()
            .map(|r| BackendEndpoint::from_config(Role::Replica, r))
            .collect();

        tracing::info!(
            primary = %primary,
            replicas = replicas.len(),
            "Backend pool loaded"
        );

        Ok(Self::new(primary, replicas))
    }

    pub fn primary(&self) -> &BackendEndpoint {
        &self.primary
    }

    /// Replicas in configuration order. May be empty.
    pub fn replicas(&self) -> &[BackendEndpoint] {
        &self.replicas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    #[test]
    fn test_pool_from_config_keeps_order() {
        let config = ClusterConfig {
            primary: EndpointConfig { host: "db0".into(), port: 3306 },
            replicas: vec![
                EndpointConfig { host: "db2".into(), port: 3306 },
                EndpointConfig { host: "db1".into(), port: 3306 },
            ],
        };

        let pool = BackendPool::from_config(&config).unwrap();
        assert_eq!(pool.primary(), &BackendEndpoint::primary("db0", 3306));
        let hosts: Vec<_> = pool.replicas().iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["db2", "db1"]);
        assert!(pool.replicas().iter().all(|r| r.role == Role::Replica));
    }

    #[test]
    fn test_pool_requires_primary() {
        let config = ClusterConfig::default();
        assert!(BackendPool::from_config(&config).is_err());
    }

    #[test]
    fn test_pool_without_replicas() {
        let pool = BackendPool::new(BackendEndpoint::primary("db0", 3306), Vec::new());
        assert!(pool.replicas().is_empty());
    }
}
