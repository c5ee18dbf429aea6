//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides injected by provisioning)
//!     → validation.rs (semantic checks for the components being started)
//!     → GatekeeperConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; topology changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatekeeperConfig;
pub use schema::{
    ClusterConfig, Component, DatabaseConfig, EndpointConfig, GatewayConfig, ObservabilityConfig,
    ProbeConfig, ProbeKind, RelayConfig, RouterConfig, SecurityConfig, TlsConfig,
};
