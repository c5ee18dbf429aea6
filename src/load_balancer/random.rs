//! Uniform random replica selection.

use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::error::GatekeeperError;
use crate::load_balancer::{backend::BackendEndpoint, pool::BackendPool, ReadStrategy};

/// Random selector.
/// Every call is an independent draw; there is no session stickiness.
#[derive(Debug, Default)]
pub struct RandomReplica;

impl RandomReplica {
    pub fn new() -> Self {
        Self
    }

    fn pick(&self, replicas: &[BackendEndpoint]) -> Option<BackendEndpoint> {
        replicas.choose(&mut rand::thread_rng()).cloned()
    }
}

#[async_trait]
impl ReadStrategy for RandomReplica {
    async fn select(&self, pool: &BackendPool) -> Result<BackendEndpoint, GatekeeperError> {
        self.pick(pool.replicas()).ok_or_else(|| {
            GatekeeperError::NoBackendAvailable("no replica endpoints configured".into())
        })
    }
}
