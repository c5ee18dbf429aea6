//! Query execution against a single endpoint.
//!
//! # Design Decisions
//! - One connection per statement: open, execute, read all rows, close
//! - No pooling and no statement caching; concurrent dispatches never
//!   share a connection
//! - Statements on the primary are committed before the connection closes

pub mod mysql;

use async_trait::async_trait;

use crate::error::GatekeeperError;
use crate::load_balancer::BackendEndpoint;

pub use mysql::MysqlExecutor;

/// Result rows: one JSON array of column values per row.
pub type Rows = Vec<Vec<serde_json::Value>>;

/// Runs one statement against one endpoint.
#[async_trait]
pub trait QueryExecutor: Send + Sync + std::fmt::Debug {
    async fn execute(&self, endpoint: &BackendEndpoint, query: &str) -> Result<Rows, GatekeeperError>;
}
