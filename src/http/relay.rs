//! TrustRelay: the internal hop between the gateway and the router.
//!
//! Performs only a shape check on queries and forwards everything else
//! verbatim. Downstream responses pass through unchanged.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    response::Response,
    routing::{get, post},
    Router,
};

use crate::error::GatekeeperError;
use crate::http::forward::Upstream;
use crate::http::request::{request_id_of, require_fields};

#[derive(Clone, Debug)]
pub struct RelayState {
    pub upstream: Upstream,
}

/// Build the relay's axum app, forwarding to the router at `upstream`.
pub fn app(upstream: Upstream) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/query", post(query))
        .route("/mode", get(mode).post(mode))
        .with_state(RelayState { upstream })
}

async fn health() -> &'static str {
    "OK"
}

async fn query(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatekeeperError> {
    require_fields(&body, &[&["query"]]).inspect_err(|e| {
        tracing::warn!(request_id = %request_id_of(&headers), error = %e, "Rejected query");
    })?;

    tracing::debug!(request_id = %request_id_of(&headers), "Relaying query");
    state.upstream.forward(Method::POST, "/query", &headers, body).await
}

async fn mode(
    State(state): State<RelayState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatekeeperError> {
    state.upstream.forward(method, "/mode", &headers, body).await
}
