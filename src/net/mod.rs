//! Network layer.
//!
//! Only the gateway faces external callers, so only the gateway listener
//! may terminate TLS. Relay and router listeners are plain TCP and rely on
//! network placement for isolation.

pub mod tls;
