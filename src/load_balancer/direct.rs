//! Direct-bypass selection: reads go to the primary.

use async_trait::async_trait;

use crate::error::GatekeeperError;
use crate::load_balancer::{backend::BackendEndpoint, pool::BackendPool, ReadStrategy};

/// Ignores replicas entirely. Used to validate the routing plumbing
/// without replica interaction.
#[derive(Debug, Default)]
pub struct DirectBypass;

#[async_trait]
impl ReadStrategy for DirectBypass {
    async fn select(&self, pool: &BackendPool) -> Result<BackendEndpoint, GatekeeperError> {
        Ok(pool.primary().clone())
    }
}
