//! MySQL executor.

use async_trait::async_trait;
use mysql_async::{prelude::Queryable, Conn, OptsBuilder, Row, TxOpts, Value};
use serde_json::Value as JsonValue;

use crate::config::DatabaseConfig;
use crate::error::GatekeeperError;
use crate::executor::{QueryExecutor, Rows};
use crate::load_balancer::BackendEndpoint;

/// Opens a fresh MySQL connection for every statement.
pub struct MysqlExecutor {
    user: String,
    password: String,
    database: String,
}

impl MysqlExecutor {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.name.clone(),
        }
    }

    fn opts(&self, endpoint: &BackendEndpoint) -> OptsBuilder {
        let db_name = (!self.database.is_empty()).then(|| self.database.clone());
        OptsBuilder::default()
            .ip_or_hostname(endpoint.host.clone())
            .tcp_port(endpoint.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(db_name)
    }
}

impl std::fmt::Debug for MysqlExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlExecutor")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

#[async_trait]
impl QueryExecutor for MysqlExecutor {
    async fn execute(&self, endpoint: &BackendEndpoint, query: &str) -> Result<Rows, GatekeeperError> {
        let mut conn = Conn::new(self.opts(endpoint)).await.map_err(|e| {
            tracing::error!(endpoint = %endpoint, error = %e, "Error connecting to MySQL");
            GatekeeperError::ConnectionFailure {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })?;

        let result = if endpoint.is_primary() {
            query_committed(&mut conn, query).await
        } else {
            conn.query::<Row, _>(query).await
        };

        if let Err(e) = conn.disconnect().await {
            tracing::debug!(endpoint = %endpoint, error = %e, "Error closing MySQL connection");
        }

        let rows = result.map_err(|e| {
            tracing::error!(endpoint = %endpoint, error = %e, "Error executing query");
            GatekeeperError::ExecutionFailure {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Run the statement in its own transaction and commit it.
async fn query_committed(conn: &mut Conn, query: &str) -> Result<Vec<Row>, mysql_async::Error> {
    let mut tx = conn.start_transaction(TxOpts::default()).await?;
    let rows = tx.query::<Row, _>(query).await?;
    tx.commit().await?;
    Ok(rows)
}

fn row_to_json(row: &Row) -> Vec<JsonValue> {
    (0..row.len())
        .map(|i| row.as_ref(i).map(value_to_json).unwrap_or(JsonValue::Null))
        .collect()
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::NULL => JsonValue::Null,
        Value::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => JsonValue::from(*v),
        Value::UInt(v) => JsonValue::from(*v),
        Value::Float(v) => serde_json::json!(*v),
        Value::Double(v) => serde_json::json!(*v),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let date = format!("{:04}-{:02}-{:02}", year, month, day);
            if *hour == 0 && *minute == 0 && *second == 0 && *micros == 0 {
                JsonValue::String(date)
            } else {
                JsonValue::String(format!(
                    "{} {:02}:{:02}:{:02}{}",
                    date, hour, minute, second, fraction(*micros)
                ))
            }
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            JsonValue::String(format!(
                "{}{:02}:{:02}:{:02}{}",
                if *negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds,
                fraction(*micros)
            ))
        }
    }
}

fn fraction(micros: u32) -> String {
    if micros == 0 {
        String::new()
    } else {
        format!(".{:06}", micros)
    }
}
