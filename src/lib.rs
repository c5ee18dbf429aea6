//! gatekeeper library: the router, relay and gateway hops and their
//! shared plumbing.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;

// Traffic management
pub mod executor;
pub mod health;
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatekeeperConfig;
pub use error::GatekeeperError;
pub use lifecycle::Shutdown;
pub use routing::{QueryKind, QueryOutcome, Router, RoutingMode};
