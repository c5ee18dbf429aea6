//! Per-component request counters.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::config::Component;
use crate::observability::metrics;

pub async fn track_requests(
    State(component): State<Component>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();

    let response = next.run(req).await;

    metrics::record_request(component.as_str(), &method, response.status().as_u16(), start);
    response
}
