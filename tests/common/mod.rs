//! Shared utilities for integration tests.
//!
//! Every hop runs as a real HTTP service on an ephemeral port. The router
//! executes against an in-memory executor, so no database is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Bytes, http::HeaderMap};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use gatekeeper::config::{Component, SecurityConfig};
use gatekeeper::error::GatekeeperError;
use gatekeeper::executor::{QueryExecutor, Rows};
use gatekeeper::health::{PingSample, Prober};
use gatekeeper::http::{gateway, relay, router_api, serve, with_common_layers, Upstream};
use gatekeeper::lifecycle::Shutdown;
use gatekeeper::load_balancer::{BackendEndpoint, BackendPool};
use gatekeeper::routing::{Router, RoutingMode};
use gatekeeper::security::SharedSecret;

pub const PASSWORD: &str = "password";

/// Executor that records every statement and answers with the target host.
/// Statements containing `FAIL` are rejected as an execution failure.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingExecutor {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hosts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(host, _)| host).collect()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, endpoint: &BackendEndpoint, query: &str) -> Result<Rows, GatekeeperError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.host.clone(), query.to_string()));

        if query.contains("FAIL") {
            return Err(GatekeeperError::ExecutionFailure {
                endpoint: endpoint.to_string(),
                reason: "You have an error in your SQL syntax".into(),
            });
        }
        Ok(vec![vec![json!(endpoint.host), json!(1)]])
    }
}

/// Prober answering from a fixed host → latency table.
#[derive(Debug, Default)]
pub struct FixedProber {
    latencies: HashMap<String, Duration>,
}

impl FixedProber {
    pub fn new(entries: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            latencies: entries
                .iter()
                .map(|(host, ms)| (host.to_string(), Duration::from_millis(*ms)))
                .collect(),
        })
    }
}

#[async_trait]
impl Prober for FixedProber {
    async fn sample(&self, replicas: &[BackendEndpoint]) -> Vec<PingSample> {
        replicas
            .iter()
            .map(|r| PingSample {
                endpoint: r.clone(),
                latency: self.latencies.get(&r.host).copied(),
            })
            .collect()
    }
}

pub fn pool(replicas: &[&str]) -> BackendPool {
    BackendPool::new(
        BackendEndpoint::primary("db0", 3306),
        replicas
            .iter()
            .map(|host| BackendEndpoint::replica(*host, 3306))
            .collect(),
    )
}

async fn spawn(app: axum::Router, component: Component, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = with_common_layers(app, component, &SecurityConfig::default());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = serve(listener, app, component, rx).await;
    });
    addr
}

pub async fn start_router(router: Arc<Router>, shutdown: &Shutdown) -> SocketAddr {
    spawn(router_api::app(router), Component::Router, shutdown).await
}

pub async fn start_relay(router_url: &str, shutdown: &Shutdown) -> SocketAddr {
    let upstream = Upstream::new(router_url).unwrap();
    spawn(relay::app(upstream), Component::Relay, shutdown).await
}

pub async fn start_gateway(relay_url: &str, shutdown: &Shutdown) -> SocketAddr {
    let upstream = Upstream::new(relay_url).unwrap();
    spawn(
        gateway::app(upstream, SharedSecret::new(PASSWORD)),
        Component::Gateway,
        shutdown,
    )
    .await
}

/// A full gateway → relay → router chain.
pub struct Chain {
    pub gateway: SocketAddr,
    pub relay: SocketAddr,
    pub router_addr: SocketAddr,
    pub router: Arc<Router>,
    pub executor: Arc<RecordingExecutor>,
    pub shutdown: Shutdown,
}

impl Chain {
    pub async fn start(pool: BackendPool, prober: Arc<dyn Prober>) -> Self {
        let shutdown = Shutdown::new();
        let executor = Arc::new(RecordingExecutor::default());
        let router = Arc::new(Router::new(pool, RoutingMode::Random, prober, executor.clone()));

        let router_addr = start_router(router.clone(), &shutdown).await;
        let relay = start_relay(&format!("http://{}", router_addr), &shutdown).await;
        let gateway = start_gateway(&format!("http://{}", relay), &shutdown).await;

        Self {
            gateway,
            relay,
            router_addr,
            router,
            executor,
            shutdown,
        }
    }

    pub fn gateway_url(&self, path: &str) -> String {
        format!("http://{}{}", self.gateway, path)
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// What a stand-in next hop observed.
#[derive(Debug, Default)]
pub struct Observed {
    pub hits: AtomicUsize,
    pub headers: Mutex<Vec<HeaderMap>>,
    pub bodies: Mutex<Vec<Bytes>>,
}

impl Observed {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a stand-in next hop that answers every request with 200 `{}` and
/// records what it received.
pub async fn start_observing_hop(shutdown: &Shutdown) -> (SocketAddr, Arc<Observed>) {
    let observed = Arc::new(Observed::default());
    let state = observed.clone();
    let app = axum::Router::new().fallback(move |headers: HeaderMap, body: Bytes| {
        let state = state.clone();
        async move {
            state.hits.fetch_add(1, Ordering::SeqCst);
            state.headers.lock().unwrap().push(headers);
            state.bodies.lock().unwrap().push(body);
            axum::Json(json!({}))
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = serve(listener, app, Component::Router, rx).await;
    });
    (addr, observed)
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
