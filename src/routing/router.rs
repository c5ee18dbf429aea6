//! Query dispatch.
//!
//! # Responsibilities
//! - Hold the cluster topology and the active routing mode
//! - Route writes to the primary and reads through the mode's strategy
//! - Execute exactly one statement on the selected endpoint
//!
//! # Design Decisions
//! - The effective mode is resolved once, before any probing, so a
//!   concurrent `set_mode` never changes an in-flight dispatch
//! - Strategies are looked up by mode, not branched on inline
//! - Empty replica sets fail reads; there is no fallback to the primary

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::GatekeeperConfig;
use crate::config::validation::ValidationError;
use crate::error::GatekeeperError;
use crate::executor::{MysqlExecutor, QueryExecutor, Rows};
use crate::health::probe::prober_from_config;
use crate::health::Prober;
use crate::load_balancer::{
    BackendEndpoint, BackendPool, DirectBypass, LowestLatency, RandomReplica, ReadStrategy, Role,
};
use crate::observability::metrics;
use crate::routing::mode::{ModeCell, RoutingMode};

/// Whether a query reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    #[serde(rename = "READ", alias = "read", alias = "Read")]
    Read,
    #[serde(rename = "WRITE", alias = "write", alias = "Write")]
    Write,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Read => "read",
            QueryKind::Write => "write",
        }
    }
}

/// Successful dispatch result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    /// `host:port` of the endpoint that ran the statement.
    pub receiver: String,
    pub role: Role,
    pub rows: Rows,
}

/// The query router.
#[derive(Debug)]
pub struct Router {
    pool: BackendPool,
    mode: ModeCell,
    strategies: HashMap<RoutingMode, Arc<dyn ReadStrategy>>,
    executor: Arc<dyn QueryExecutor>,
}

impl Router {
    /// Create a router over `pool`, starting in `default_mode`.
    pub fn new(
        pool: BackendPool,
        default_mode: RoutingMode,
        prober: Arc<dyn Prober>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        let mut strategies: HashMap<RoutingMode, Arc<dyn ReadStrategy>> = HashMap::new();
        strategies.insert(RoutingMode::Random, Arc::new(RandomReplica::new()));
        strategies.insert(RoutingMode::LowestLatency, Arc::new(LowestLatency::new(prober)));
        strategies.insert(RoutingMode::DirectBypass, Arc::new(DirectBypass));

        Self {
            pool,
            mode: ModeCell::new(default_mode),
            strategies,
            executor,
        }
    }

    /// Build a router backed by MySQL and the configured probe.
    pub fn from_config(config: &GatekeeperConfig) -> Result<Self, ValidationError> {
        let pool = BackendPool::from_config(&config.cluster)?;
        Ok(Self::new(
            pool,
            config.router.default_mode,
            prober_from_config(&config.probe),
            Arc::new(MysqlExecutor::new(&config.database)),
        ))
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    /// Current process-wide read mode.
    pub fn mode(&self) -> RoutingMode {
        self.mode.get()
    }

    /// Change the read mode for subsequent dispatches. Returns the previous mode.
    pub fn set_mode(&self, mode: RoutingMode) -> Result<RoutingMode, GatekeeperError> {
        let previous = self.mode.set(mode)?;
        tracing::info!(from = %previous, to = %mode, "Routing mode changed");
        Ok(previous)
    }

    fn strategy(&self, mode: RoutingMode) -> Result<&Arc<dyn ReadStrategy>, GatekeeperError> {
        self.strategies.get(&mode).ok_or_else(|| {
            GatekeeperError::NoBackendAvailable(format!("no strategy registered for mode '{}'", mode))
        })
    }

    /// Route and execute one query.
    pub async fn dispatch(
        &self,
        query: &str,
        kind: QueryKind,
        mode_override: Option<RoutingMode>,
    ) -> Result<QueryOutcome, GatekeeperError> {
        if query.trim().is_empty() {
            return Err(GatekeeperError::MalformedRequest("query must not be empty".into()));
        }

        let (target, mode): (BackendEndpoint, Option<RoutingMode>) = match kind {
            QueryKind::Write => (self.pool.primary().clone(), None),
            QueryKind::Read => {
                let mode = mode_override.unwrap_or_else(|| self.mode.get());
                let target = self.strategy(mode)?.select(&self.pool).await.inspect_err(|e| {
                    tracing::warn!(mode = %mode, error = %e, "No endpoint selected for read");
                })?;
                (target, Some(mode))
            }
        };

        tracing::debug!(
            kind = kind.as_str(),
            mode = mode.map(|m| m.as_str()).unwrap_or("-"),
            target = %target,
            "Dispatching query"
        );
        metrics::record_dispatch(kind.as_str(), mode.map(|m| m.as_str()), target.role.as_str());

        let rows = self.executor.execute(&target, query).await?;

        Ok(QueryOutcome {
            receiver: target.to_string(),
            role: target.role,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::PingSample;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Executor that records every target and returns a single row.
    #[derive(Debug, Default)]
    struct RecordingExecutor {
        targets: Mutex<Vec<BackendEndpoint>>,
        fail_with: Option<&'static str>,
    }

    impl RecordingExecutor {
        fn targets(&self) -> Vec<BackendEndpoint> {
            self.targets.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        async fn execute(&self, endpoint: &BackendEndpoint, _query: &str) -> Result<Rows, GatekeeperError> {
            self.targets.lock().unwrap().push(endpoint.clone());
            match self.fail_with {
                Some(reason) => Err(GatekeeperError::ExecutionFailure {
                    endpoint: endpoint.to_string(),
                    reason: reason.to_string(),
                }),
                None => Ok(vec![vec![serde_json::json!(1)]]),
            }
        }
    }

    /// Prober that favours one host and can hold a dispatch mid-probe.
    #[derive(Debug)]
    struct GatedProber {
        fastest: &'static str,
        calls: AtomicUsize,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl GatedProber {
        fn favouring(fastest: &'static str) -> Self {
            Self { fastest, calls: AtomicUsize::new(0), gate: None }
        }
    }

    #[async_trait]
    impl Prober for GatedProber {
        async fn sample(&self, replicas: &[BackendEndpoint]) -> Vec<PingSample> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            replicas
                .iter()
                .map(|r| PingSample {
                    endpoint: r.clone(),
                    latency: Some(if r.host == self.fastest {
                        Duration::from_millis(50)
                    } else {
                        Duration::from_millis(200)
                    }),
                })
                .collect()
        }
    }

    fn pool(replicas: &[&str]) -> BackendPool {
        BackendPool::new(
            BackendEndpoint::primary("db0", 3306),
            replicas.iter().map(|h| BackendEndpoint::replica(*h, 3306)).collect(),
        )
    }

    fn router(replicas: &[&str]) -> (Router, Arc<RecordingExecutor>, Arc<GatedProber>) {
        let executor = Arc::new(RecordingExecutor::default());
        let prober = Arc::new(GatedProber::favouring("db1"));
        let router = Router::new(pool(replicas), RoutingMode::Random, prober.clone(), executor.clone());
        (router, executor, prober)
    }

    #[tokio::test]
    async fn test_writes_always_hit_primary() {
        let (router, executor, prober) = router(&["db1", "db2"]);

        for mode in [None, Some(RoutingMode::Random), Some(RoutingMode::LowestLatency)] {
            let outcome = router.dispatch("INSERT INTO t VALUES (1)", QueryKind::Write, mode).await.unwrap();
            assert_eq!(outcome.receiver, "db0:3306");
            assert_eq!(outcome.role, Role::Primary);
        }
        router.set_mode(RoutingMode::LowestLatency).unwrap();
        router.dispatch("SELECT 1", QueryKind::Write, None).await.unwrap();

        assert!(executor.targets().iter().all(|t| t.is_primary()));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reads_use_replicas_only() {
        let (router, executor, _) = router(&["db1", "db2"]);

        for _ in 0..200 {
            router.dispatch("SELECT 1", QueryKind::Read, None).await.unwrap();
        }

        let targets = executor.targets();
        assert!(targets.iter().all(|t| t.role == Role::Replica));
        assert!(targets.iter().any(|t| t.host == "db1"));
        assert!(targets.iter().any(|t| t.host == "db2"));
    }

    #[tokio::test]
    async fn test_empty_replicas_never_fall_back() {
        let (router, executor, _) = router(&[]);

        for mode in [RoutingMode::Random, RoutingMode::LowestLatency] {
            let err = router.dispatch("SELECT 1", QueryKind::Read, Some(mode)).await.unwrap_err();
            assert!(matches!(err, GatekeeperError::NoBackendAvailable(_)));
        }
        // No connection was attempted anywhere.
        assert!(executor.targets().is_empty());
    }

    #[tokio::test]
    async fn test_set_mode_switches_strategy() {
        let (router, executor, prober) = router(&["db1", "db2"]);
        router.set_mode(RoutingMode::LowestLatency).unwrap();
        assert_eq!(router.mode(), RoutingMode::LowestLatency);

        for _ in 0..5 {
            let outcome = router.dispatch("SELECT 1", QueryKind::Read, None).await.unwrap();
            assert_eq!(outcome.receiver, "db1:3306");
        }
        assert_eq!(prober.calls.load(Ordering::SeqCst), 5);
        assert_eq!(executor.targets().len(), 5);
    }

    #[tokio::test]
    async fn test_override_beats_current_mode() {
        let (router, _, prober) = router(&["db1", "db2"]);
        router.set_mode(RoutingMode::LowestLatency).unwrap();

        router.dispatch("SELECT 1", QueryKind::Read, Some(RoutingMode::Random)).await.unwrap();
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);

        let outcome = router
            .dispatch("SELECT 1", QueryKind::Read, Some(RoutingMode::DirectBypass))
            .await
            .unwrap();
        assert_eq!(outcome.role, Role::Primary);
        // The override did not change the stored mode.
        assert_eq!(router.mode(), RoutingMode::LowestLatency);
    }

    #[tokio::test]
    async fn test_direct_mode_cannot_be_stored() {
        let (router, _, _) = router(&["db1"]);
        let err = router.set_mode(RoutingMode::DirectBypass).unwrap_err();
        assert!(matches!(err, GatekeeperError::MalformedRequest(_)));
        assert_eq!(router.mode(), RoutingMode::Random);
    }

    #[tokio::test]
    async fn test_empty_query_is_malformed() {
        let (router, executor, _) = router(&["db1"]);
        let err = router.dispatch("   ", QueryKind::Read, None).await.unwrap_err();
        assert!(matches!(err, GatekeeperError::MalformedRequest(_)));
        assert!(executor.targets().is_empty());
    }

    #[tokio::test]
    async fn test_execution_failure_is_not_retried() {
        let executor = Arc::new(RecordingExecutor {
            targets: Mutex::new(Vec::new()),
            fail_with: Some("Table 'sakila.nope' doesn't exist"),
        });
        let router = Router::new(
            pool(&["db1"]),
            RoutingMode::Random,
            Arc::new(GatedProber::favouring("db1")),
            executor.clone(),
        );

        let err = router.dispatch("SELECT * FROM nope", QueryKind::Read, None).await.unwrap_err();
        assert!(matches!(err, GatekeeperError::ExecutionFailure { .. }));
        assert_eq!(executor.targets().len(), 1);
    }

    #[tokio::test]
    async fn test_mode_change_mid_dispatch_is_not_observed() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let prober = Arc::new(GatedProber {
            fastest: "db2",
            calls: AtomicUsize::new(0),
            gate: Some((entered.clone(), release.clone())),
        });
        let executor = Arc::new(RecordingExecutor::default());
        let router = Arc::new(Router::new(
            pool(&["db1", "db2"]),
            RoutingMode::LowestLatency,
            prober.clone(),
            executor,
        ));

        let in_flight = {
            let router = router.clone();
            tokio::spawn(async move { router.dispatch("SELECT 1", QueryKind::Read, None).await })
        };

        entered.notified().await;
        router.set_mode(RoutingMode::Random).unwrap();
        release.notify_one();

        let outcome = in_flight.await.unwrap().unwrap();
        assert_eq!(outcome.receiver, "db2:3306");
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
        assert_eq!(router.mode(), RoutingMode::Random);
    }

    #[test]
    fn test_query_kind_wire_names() {
        let kind: QueryKind = serde_json::from_str("\"READ\"").unwrap();
        assert_eq!(kind, QueryKind::Read);
        let kind: QueryKind = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(kind, QueryKind::Write);
        assert!(serde_json::from_str::<QueryKind>("\"DELETE\"").is_err());
    }
}
