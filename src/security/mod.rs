//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming gateway request:
//!     → credential.rs (shared-secret check on X-Gatekeeper-Password)
//!     → shape validation (http::request)
//!     → forwarded to the relay without the credential header
//! ```
//!
//! # Trust Boundaries
//! - Gateway: the only externally reachable hop; checks the credential
//! - Relay: accepts calls only from the gateway. This is enforced by network
//!   placement, not by any cryptographic check
//! - Router: reachable only from the relay, by the same placement rule

pub mod credential;

pub use credential::{SharedSecret, GATEKEEPER_PASSWORD_HEADER};
