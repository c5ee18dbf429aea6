//! Request-path error taxonomy.
//!
//! Every hop reports the failures it detects itself with one of these
//! variants. Errors that originate further down the chain are never
//! rewritten: forwarding hops pass the downstream status and body through.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Why a credential check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The credential header was not presented.
    Missing,
    /// The credential header did not match the configured secret.
    Mismatch,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::Missing => "missing",
            AuthFailure::Mismatch => "mismatch",
        }
    }
}

/// Errors produced while validating, routing, or executing a request.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Missing or invalid request fields.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Credential header absent or wrong.
    #[error("Unauthorized access")]
    Unauthorized(AuthFailure),

    /// No replica could be selected for a read.
    #[error("No backend available: {0}")]
    NoBackendAvailable(String),

    /// The backend could not be reached.
    #[error("Failed to connect to {endpoint}: {reason}")]
    ConnectionFailure { endpoint: String, reason: String },

    /// The backend accepted the connection but failed the statement.
    #[error("Error executing query on {endpoint}: {reason}")]
    ExecutionFailure { endpoint: String, reason: String },

    /// A hop could not reach the next hop.
    #[error("Upstream unreachable: {0}")]
    UpstreamTransportFailure(String),
}

impl GatekeeperError {
    /// HTTP status reported to the caller for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            GatekeeperError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            GatekeeperError::Unauthorized(AuthFailure::Missing) => StatusCode::UNAUTHORIZED,
            GatekeeperError::Unauthorized(AuthFailure::Mismatch) => StatusCode::FORBIDDEN,
            GatekeeperError::NoBackendAvailable(_)
            | GatekeeperError::ConnectionFailure { .. }
            | GatekeeperError::ExecutionFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatekeeperError::UpstreamTransportFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatekeeperError::MalformedRequest(_) => "malformed_request",
            GatekeeperError::Unauthorized(_) => "unauthorized",
            GatekeeperError::NoBackendAvailable(_) => "no_backend_available",
            GatekeeperError::ConnectionFailure { .. } => "connection_failure",
            GatekeeperError::ExecutionFailure { .. } => "execution_failure",
            GatekeeperError::UpstreamTransportFailure(_) => "upstream_transport_failure",
        }
    }
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatekeeperError::MalformedRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatekeeperError::Unauthorized(AuthFailure::Missing).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatekeeperError::Unauthorized(AuthFailure::Mismatch).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatekeeperError::NoBackendAvailable("empty".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatekeeperError::UpstreamTransportFailure("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = GatekeeperError::NoBackendAvailable("no replicas configured".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["error"],
            "No backend available: no replicas configured"
        );
    }
}
