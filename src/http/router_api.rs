//! Router HTTP ingress.
//!
//! # Routes
//! - `POST /query`: route and execute one statement
//! - `GET /mode`, `POST /mode`: read or change the process-wide read mode
//! - `GET /health`: liveness

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GatekeeperError;
use crate::routing::{QueryKind, QueryOutcome, Router, RoutingMode};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: Option<String>,
    #[serde(alias = "operation")]
    pub query_type: Option<QueryKind>,
    pub mode: Option<RoutingMode>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ModeBody {
    pub mode: Option<RoutingMode>,
}

/// Build the router's axum app.
pub fn app(router: Arc<Router>) -> axum::Router {
    axum::Router::new()
        .route("/query", post(query))
        .route("/mode", get(get_mode).post(set_mode))
        .route("/health", get(health))
        .with_state(router)
}

fn malformed(rejection: JsonRejection) -> GatekeeperError {
    GatekeeperError::MalformedRequest(rejection.body_text())
}

async fn query(
    State(router): State<Arc<Router>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryOutcome>, GatekeeperError> {
    let Json(request) = payload.map_err(malformed)?;

    let query = request
        .query
        .ok_or_else(|| GatekeeperError::MalformedRequest("missing required field 'query'".into()))?;
    let kind = request.query_type.ok_or_else(|| {
        GatekeeperError::MalformedRequest("missing required field 'query_type'".into())
    })?;

    let outcome = router.dispatch(&query, kind, request.mode).await?;
    Ok(Json(outcome))
}

async fn get_mode(State(router): State<Arc<Router>>) -> Json<ModeBody> {
    Json(ModeBody {
        mode: Some(router.mode()),
    })
}

async fn set_mode(
    State(router): State<Arc<Router>>,
    payload: Result<Json<ModeBody>, JsonRejection>,
) -> Result<Json<ModeBody>, GatekeeperError> {
    let Json(body) = payload.map_err(malformed)?;
    let mode = body
        .mode
        .ok_or_else(|| GatekeeperError::MalformedRequest("missing required field 'mode'".into()))?;

    router.set_mode(mode)?;
    Ok(Json(ModeBody { mode: Some(mode) }))
}

async fn health() -> &'static str {
    "OK"
}
