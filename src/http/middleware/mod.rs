//! Middleware shared by the hops.

pub mod auth;
pub mod metrics;

pub use auth::require_credential;
pub use metrics::track_requests;
