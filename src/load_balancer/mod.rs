//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! Read query + effective RoutingMode
//!     → strategy lookup keyed by mode:
//!         - random.rs (uniform draw over replicas)
//!         - lowest_latency.rs (probe every replica, pick the fastest)
//!         - direct.rs (primary, bypassing replica selection)
//!     → pool.rs (primary + ordered replicas)
//!     → selected BackendEndpoint or NoBackendAvailable
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless; the pool is read-only after startup
//! - Reads never fall back to the primary when replicas are missing
//!   (except through the explicit direct mode)

pub mod backend;
pub mod direct;
pub mod lowest_latency;
pub mod pool;
pub mod random;

use async_trait::async_trait;

use crate::error::GatekeeperError;

pub use backend::{BackendEndpoint, Role};
pub use direct::DirectBypass;
pub use lowest_latency::LowestLatency;
pub use pool::BackendPool;
pub use random::RandomReplica;

/// Selects the endpoint that serves a read query.
#[async_trait]
pub trait ReadStrategy: Send + Sync + std::fmt::Debug {
    async fn select(&self, pool: &BackendPool) -> Result<BackendEndpoint, GatekeeperError>;
}
