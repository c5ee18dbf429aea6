//! Lowest-latency replica selection.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::GatekeeperError;
use crate::health::{PingSample, Prober};
use crate::load_balancer::{backend::BackendEndpoint, pool::BackendPool, ReadStrategy};

/// Probes every replica on each call and selects the one with strictly
/// minimal latency. In case of tie, the earliest replica in pool order wins.
#[derive(Debug)]
pub struct LowestLatency {
    prober: Arc<dyn Prober>,
}

impl LowestLatency {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }
}

/// Pick the sample with strictly minimal latency. Failed probes count as
/// `+inf`, so `None` is returned when every probe failed.
pub fn fastest(samples: &[PingSample]) -> Option<&PingSample> {
    let mut best: Option<&PingSample> = None;
    let mut lowest = f64::INFINITY;

    for sample in samples {
        let latency = sample.latency_seconds();
        if latency < lowest {
            lowest = latency;
            best = Some(sample);
        }
    }
    best
}

#[async_trait]
impl ReadStrategy for LowestLatency {
    async fn select(&self, pool: &BackendPool) -> Result<BackendEndpoint, GatekeeperError> {
        let replicas = pool.replicas();
        if replicas.is_empty() {
            return Err(GatekeeperError::NoBackendAvailable(
                "no replica endpoints configured".into(),
            ));
        }

        let samples = self.prober.sample(replicas).await;
        fastest(&samples)
            .map(|s| s.endpoint.clone())
            .ok_or_else(|| {
                GatekeeperError::NoBackendAvailable("every replica failed its latency probe".into())
            })
    }
}
