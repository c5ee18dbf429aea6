//! Replica liveness probes.
//!
//! # Responsibilities
//! - Measure the round trip to one replica (`LatencyProbe`)
//! - Apply the fixed per-probe timeout
//! - Probe a replica list sequentially or concurrently (`Prober`)
//!
//! A failed or timed-out probe is recorded as infinite latency.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use futures_util::future::join_all;
use hyper::{header, Method};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time;

use crate::config::{ProbeConfig, ProbeKind};
use crate::load_balancer::backend::BackendEndpoint;
use crate::observability::metrics;

/// Transient latency measurement for one replica.
#[derive(Debug, Clone, PartialEq)]
pub struct PingSample {
    pub endpoint: BackendEndpoint,
    /// `None` when the probe failed or timed out.
    pub latency: Option<Duration>,
}

impl PingSample {
    /// Latency in seconds, `+inf` for a failed probe.
    pub fn latency_seconds(&self) -> f64 {
        self.latency.map(|d| d.as_secs_f64()).unwrap_or(f64::INFINITY)
    }
}

/// A single liveness probe against one endpoint.
#[async_trait]
pub trait LatencyProbe: Send + Sync + std::fmt::Debug {
    /// Measure the endpoint. An error means it is considered unreachable.
    async fn measure(&self, endpoint: &BackendEndpoint) -> Result<Duration, String>;
}

/// Probes by opening (and immediately closing) a TCP connection to the
/// endpoint's database port.
#[derive(Debug, Default)]
pub struct TcpProbe;

#[async_trait]
impl LatencyProbe for TcpProbe {
    async fn measure(&self, endpoint: &BackendEndpoint) -> Result<Duration, String> {
        let start = Instant::now();
        TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| e.to_string())?;
        Ok(start.elapsed())
    }
}

/// Probes with an HTTP GET against the endpoint's host. Any response counts
/// as alive.
#[derive(Debug)]
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    port: u16,
    path: String,
}

impl HttpProbe {
    pub fn new(port: u16, path: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            client,
            port,
            path: path.into(),
        }
    }
}

#[async_trait]
impl LatencyProbe for HttpProbe {
    async fn measure(&self, endpoint: &BackendEndpoint) -> Result<Duration, String> {
        let uri = format!("http://{}:{}{}", endpoint.host, self.port, self.path);
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, "gatekeeper-latency-probe")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;

        let start = Instant::now();
        self.client.request(request).await.map_err(|e| e.to_string())?;
        Ok(start.elapsed())
    }
}

/// Samples the latency of a list of replicas.
#[async_trait]
pub trait Prober: Send + Sync + std::fmt::Debug {
    /// Return one sample per replica, in the order given.
    async fn sample(&self, replicas: &[BackendEndpoint]) -> Vec<PingSample>;
}

/// Run one probe under the timeout and record the outcome.
async fn timed_probe(
    probe: &dyn LatencyProbe,
    timeout: Duration,
    endpoint: &BackendEndpoint,
) -> PingSample {
    let latency = match time::timeout(timeout, probe.measure(endpoint)).await {
        Ok(Ok(latency)) => Some(latency),
        Ok(Err(e)) => {
            tracing::warn!(endpoint = %endpoint, error = %e, "Latency probe failed");
            None
        }
        Err(_) => {
            tracing::warn!(endpoint = %endpoint, timeout = ?timeout, "Latency probe timed out");
            None
        }
    };

    metrics::record_probe(&endpoint.to_string(), latency);
    tracing::debug!(endpoint = %endpoint, latency = ?latency, "Probe sample");

    PingSample {
        endpoint: endpoint.clone(),
        latency,
    }
}

/// Probes replicas one at a time, blocking until every probe completes.
/// Worst case is `replicas × timeout`.
#[derive(Debug)]
pub struct SequentialProber {
    probe: Arc<dyn LatencyProbe>,
    timeout: Duration,
}

impl SequentialProber {
    pub fn new(probe: Arc<dyn LatencyProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }
}

#[async_trait]
impl Prober for SequentialProber {
    async fn sample(&self, replicas: &[BackendEndpoint]) -> Vec<PingSample> {
        let mut samples = Vec::with_capacity(replicas.len());
        for endpoint in replicas {
            samples.push(timed_probe(self.probe.as_ref(), self.timeout, endpoint).await);
        }
        samples
    }
}

/// Probes all replicas at once. Samples keep pool order, so tie-breaking is
/// identical to the sequential schedule.
#[derive(Debug)]
pub struct ConcurrentProber {
    probe: Arc<dyn LatencyProbe>,
    timeout: Duration,
}

impl ConcurrentProber {
    pub fn new(probe: Arc<dyn LatencyProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }
}

#[async_trait]
impl Prober for ConcurrentProber {
    async fn sample(&self, replicas: &[BackendEndpoint]) -> Vec<PingSample> {
        join_all(
            replicas
                .iter()
                .map(|endpoint| timed_probe(self.probe.as_ref(), self.timeout, endpoint)),
        )
        .await
    }
}

/// Build the prober described by the configuration.
pub fn prober_from_config(config: &ProbeConfig) -> Arc<dyn Prober> {
    let probe: Arc<dyn LatencyProbe> = match config.kind {
        ProbeKind::Tcp => Arc::new(TcpProbe),
        ProbeKind::Http => Arc::new(HttpProbe::new(config.http_port, config.http_path.clone())),
    };
    let timeout = Duration::from_secs(config.timeout_secs);

    if config.concurrent {
        Arc::new(ConcurrentProber::new(probe, timeout))
    } else {
        Arc::new(SequentialProber::new(probe, timeout))
    }
}
