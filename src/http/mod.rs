//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client
//!     → gateway.rs (credential check, shape check)
//!     → forward.rs ─▶ relay.rs (shape check)
//!     → forward.rs ─▶ router_api.rs (dispatch, execute)
//!     ◀ response passed back unchanged through each hop
//! ```
//!
//! Every app is wrapped by `server::with_common_layers` (request ID,
//! tracing, metrics, body limit).

pub mod forward;
pub mod gateway;
pub mod middleware;
pub mod relay;
pub mod request;
pub mod router_api;
pub mod server;

pub use forward::Upstream;
pub use request::X_REQUEST_ID;
pub use server::{serve, serve_tls, with_common_layers};
