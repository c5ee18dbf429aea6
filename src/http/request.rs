//! Request identity and shape validation.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID at the first hop that lacks one
//! - Check that a JSON body carries the fields a hop requires
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing and forwarded verbatim
//! - Shape checks never rewrite the body; the original bytes are forwarded

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::GatekeeperError;

/// Header carrying the request ID across hops.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a fresh UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID from headers, for logging.
pub fn request_id_of(headers: &axum::http::HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Require that `body` is a JSON object and that, for each group in
/// `required`, at least one of the listed field names is present and non-null.
pub fn require_fields(body: &[u8], required: &[&[&str]]) -> Result<(), GatekeeperError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| GatekeeperError::MalformedRequest(format!("invalid JSON body: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| GatekeeperError::MalformedRequest("body must be a JSON object".into()))?;

    for group in required {
        let present = group
            .iter()
            .any(|name| object.get(*name).is_some_and(|v| !v.is_null()));
        if !present {
            return Err(GatekeeperError::MalformedRequest(format!(
                "missing required field '{}'",
                group.join("' or '")
            )));
        }
    }
    Ok(())
}
