//! Gateway credential check.
//! Runs before any shape validation and before anything is forwarded.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatekeeperError;
use crate::http::request::request_id_of;
use crate::observability::metrics;
use crate::security::{SharedSecret, GATEKEEPER_PASSWORD_HEADER};

pub async fn require_credential(
    State(secret): State<SharedSecret>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(&GATEKEEPER_PASSWORD_HEADER)
        .map(|v| v.as_bytes());

    match secret.verify(presented) {
        Ok(()) => next.run(req).await,
        Err(failure) => {
            tracing::warn!(
                request_id = %request_id_of(req.headers()),
                reason = failure.as_str(),
                path = %req.uri().path(),
                "Rejected request with bad credential"
            );
            metrics::record_auth_rejection(failure.as_str());
            GatekeeperError::Unauthorized(failure).into_response()
        }
    }
}
