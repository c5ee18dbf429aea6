//! Replica latency probing.
//!
//! # Data Flow
//! ```text
//! Lowest-latency dispatch
//!     → probe.rs Prober (sequential by default, concurrent opt-in)
//!     → LatencyProbe per replica (TCP connect or HTTP GET) under timeout
//!     → PingSample[] in pool order
//!     → load_balancer::lowest_latency picks the minimum
//! ```
//!
//! # Design Decisions
//! - Samples are recomputed for every dispatch and never stored
//! - Probe results never evict a replica; there is no health state

pub mod probe;

pub use probe::{LatencyProbe, PingSample, Prober};
