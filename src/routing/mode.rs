//! Routing modes and the process-wide active mode.
//!
//! # Design Decisions
//! - The active mode is a single `AtomicU8`: one writer at a time, any
//!   number of readers, no lock on the read path
//! - A dispatch loads the mode once; later changes never affect it
//! - `DirectBypass` is a per-request override only and cannot be stored

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::GatekeeperError;

/// Strategy used to pick the endpoint for a read query.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Uniformly random replica, fresh draw per query.
    Random = 0,
    /// Replica with the lowest measured probe latency.
    #[serde(alias = "customized", alias = "custom")]
    LowestLatency = 1,
    /// Send the read straight to the primary (plumbing checks).
    #[serde(rename = "direct", alias = "directhit", alias = "direct_bypass")]
    DirectBypass = 2,
}

impl RoutingMode {
    pub const ALL: [RoutingMode; 3] = [
        RoutingMode::Random,
        RoutingMode::LowestLatency,
        RoutingMode::DirectBypass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Random => "random",
            RoutingMode::LowestLatency => "lowest_latency",
            RoutingMode::DirectBypass => "direct",
        }
    }

    /// Whether this mode may become the process-wide mode.
    pub fn is_settable(&self) -> bool {
        !matches!(self, RoutingMode::DirectBypass)
    }
}

impl std::fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl std::fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown routing mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for RoutingMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random" => Ok(RoutingMode::Random),
            "lowest_latency" | "customized" | "custom" => Ok(RoutingMode::LowestLatency),
            "direct" | "directhit" | "direct_bypass" => Ok(RoutingMode::DirectBypass),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl From<u8> for RoutingMode {
    fn from(val: u8) -> Self {
        match val {
            1 => RoutingMode::LowestLatency,
            2 => RoutingMode::DirectBypass,
            _ => RoutingMode::Random,
        }
    }
}

/// The active read-routing mode, shared by every dispatch.
#[derive(Debug)]
pub struct ModeCell {
    current: AtomicU8,
}

impl ModeCell {
    /// Create a cell holding `initial`. Non-settable modes fall back to `Random`.
    pub fn new(initial: RoutingMode) -> Self {
        let initial = if initial.is_settable() { initial } else { RoutingMode::Random };
        Self {
            current: AtomicU8::new(initial as u8),
        }
    }

    /// Snapshot of the current mode.
    pub fn get(&self) -> RoutingMode {
        RoutingMode::from(self.current.load(Ordering::Acquire))
    }

    /// Replace the current mode. Returns the previous one.
    pub fn set(&self, mode: RoutingMode) -> Result<RoutingMode, GatekeeperError> {
        if !mode.is_settable() {
            return Err(GatekeeperError::MalformedRequest(format!(
                "mode '{}' can only be used as a per-request override",
                mode
            )));
        }
        Ok(RoutingMode::from(self.current.swap(mode as u8, Ordering::AcqRel)))
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(RoutingMode::Random)
    }
}
