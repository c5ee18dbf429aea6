//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch(query, kind, mode override?)
//!     → Write: primary, unconditionally
//!     → Read: effective mode = override or mode.rs ModeCell snapshot
//!         → load_balancer strategy keyed by mode
//!     → executor (one connection, one statement)
//!     → QueryOutcome { receiver, rows } or GatekeeperError
//! ```
//!
//! # Design Decisions
//! - The active mode is the only mutable state; the pool is frozen at startup
//! - No retries: every error is terminal for the dispatch
//! - Mode transitions happen only through `set_mode`, never automatically

pub mod mode;
pub mod router;

pub use mode::{ModeCell, RoutingMode};
pub use router::{QueryKind, QueryOutcome, Router};
