//! HTTP server setup shared by every hop.
//!
//! # Responsibilities
//! - Wire up common middleware (request ID, tracing, metrics, body limit)
//! - Serve apps on bound listeners (plain TCP, or TLS for the gateway)
//! - Graceful shutdown on the broadcast signal

use axum::{
    body::Body,
    http::Request,
    middleware,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{Component, SecurityConfig};
use crate::http::middleware::track_requests;
use crate::http::request::{request_id_of, UuidRequestId, X_REQUEST_ID};

/// Wrap a component's routes with the middleware every hop carries.
pub fn with_common_layers(app: Router, component: Component, security: &SecurityConfig) -> Router {
    let name = component.as_str();
    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    component = name,
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id_of(request.headers()),
                )
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(middleware::from_fn_with_state(component, track_requests))
            .layer(RequestBodyLimitLayer::new(security.max_body_size)),
    )
}

/// Serve `app` on a bound listener until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    component: Component,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(component = %component, address = %addr, "HTTP server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!(component = %component, "Shutdown signal received");
        })
        .await?;

    tracing::info!(component = %component, "HTTP server stopped");
    Ok(())
}

/// Serve `app` over TLS on a bound listener until `shutdown` fires.
pub async fn serve_tls(
    listener: TcpListener,
    rustls: RustlsConfig,
    app: Router,
    component: Component,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    let handle = axum_server::Handle::new();

    let signal_handle = handle.clone();
    tokio::spawn(async move {
        let _ = shutdown.recv().await;
        tracing::info!(component = %component, "Shutdown signal received");
        signal_handle.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    tracing::info!(component = %component, address = %addr, "HTTPS server starting");
    axum_server::from_tcp_rustls(listener.into_std()?, rustls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!(component = %component, "HTTPS server stopped");
    Ok(())
}
