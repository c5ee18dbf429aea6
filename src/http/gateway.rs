//! AuthenticatingGateway: the only externally reachable hop.
//!
//! # Responsibilities
//! - Reject callers without the shared secret (see `middleware::auth`)
//! - Check that queries carry the routing fields
//! - Forward to the relay and return its response unchanged
//!
//! The credential header is never forwarded; `Upstream` copies only the
//! request ID.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};

use crate::error::GatekeeperError;
use crate::http::forward::Upstream;
use crate::http::middleware::require_credential;
use crate::http::request::{request_id_of, require_fields};
use crate::security::SharedSecret;

#[derive(Clone, Debug)]
pub struct GatewayState {
    pub upstream: Upstream,
}

/// Build the gateway's axum app. Every route, including unknown paths,
/// requires the credential.
pub fn app(upstream: Upstream, secret: SharedSecret) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/mode", get(mode).post(mode))
        .with_state(GatewayState { upstream })
        .layer(middleware::from_fn_with_state(secret, require_credential))
}

async fn query(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatekeeperError> {
    require_fields(&body, &[&["query"], &["query_type", "operation"]]).inspect_err(|e| {
        tracing::warn!(request_id = %request_id_of(&headers), error = %e, "Rejected query");
    })?;

    tracing::debug!(
        request_id = %request_id_of(&headers),
        relay = %state.upstream.base(),
        "Forwarding query"
    );
    state.upstream.forward(Method::POST, "/query", &headers, body).await
}

async fn mode(
    State(state): State<GatewayState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatekeeperError> {
    state.upstream.forward(method, "/mode", &headers, body).await
}
