//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_total` (counter): requests by component, method, status
//! - `gatekeeper_request_duration_seconds` (histogram): per-component latency
//! - `gatekeeper_dispatch_total` (counter): dispatches by kind, mode, target role
//! - `gatekeeper_probe_latency_seconds` (histogram): successful probe latencies
//! - `gatekeeper_probe_failures_total` (counter): failed or timed-out probes
//! - `gatekeeper_auth_rejections_total` (counter): gateway rejections by reason

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(component: &'static str, method: &str, status: u16, start: Instant) {
    counter!(
        "gatekeeper_requests_total",
        "component" => component,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gatekeeper_request_duration_seconds", "component" => component)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch(kind: &'static str, mode: Option<&'static str>, role: &'static str) {
    counter!(
        "gatekeeper_dispatch_total",
        "kind" => kind,
        "mode" => mode.unwrap_or("none"),
        "role" => role
    )
    .increment(1);
}

pub fn record_probe(endpoint: &str, latency: Option<Duration>) {
    match latency {
        Some(latency) => {
            histogram!("gatekeeper_probe_latency_seconds", "endpoint" => endpoint.to_string())
                .record(latency.as_secs_f64());
        }
        None => {
            counter!("gatekeeper_probe_failures_total", "endpoint" => endpoint.to_string())
                .increment(1);
        }
    }
}

pub fn record_auth_rejection(reason: &'static str) {
    counter!("gatekeeper_auth_rejections_total", "reason" => reason).increment(1);
}
