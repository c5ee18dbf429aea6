//! Startup orchestration.
//!
//! # Responsibilities
//! - Build each requested component's state from validated config
//! - Load gateway TLS material and bind listeners
//! - Run every component until shutdown and surface the first failure
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Every listener is bound and the TLS material loaded before any server
//!   task starts, so a bad address or certificate fails the whole process
//!   instead of leaving a partial chain running

use futures_util::future::{BoxFuture, FutureExt};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::validation::ValidationError;
use crate::config::{Component, GatekeeperConfig};
use crate::http::{gateway, relay, router_api, serve, serve_tls, with_common_layers, Upstream};
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;
use crate::routing::Router;
use crate::security::SharedSecret;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("invalid {component} next-hop URL '{url}': {source}")]
    NextHop {
        component: Component,
        url: String,
        source: url::ParseError,
    },

    #[error("{component} failed to bind {address}: {source}")]
    Bind {
        component: Component,
        address: String,
        source: std::io::Error,
    },

    #[error("gateway TLS configuration: {0}")]
    Tls(std::io::Error),

    #[error("{component} server failed: {source}")]
    Serve {
        component: Component,
        source: std::io::Error,
    },

    #[error("server task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

async fn bind(component: Component, address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            component,
            address: address.to_string(),
            source,
        })
}

fn upstream(component: Component, url: &str) -> Result<Upstream, StartupError> {
    Upstream::new(url).map_err(|source| StartupError::NextHop {
        component,
        url: url.to_string(),
        source,
    })
}

/// A bound component, ready to serve.
pub type PendingServer = (Component, BoxFuture<'static, std::io::Result<()>>);

/// Build state, load TLS material and bind a listener for every requested
/// component. Nothing is served yet.
pub async fn prepare(
    config: &GatekeeperConfig,
    components: &[Component],
    shutdown: &Shutdown,
) -> Result<Vec<PendingServer>, StartupError> {
    let mut pending: Vec<PendingServer> = Vec::with_capacity(components.len());

    for &component in components {
        match component {
            Component::Router => {
                let router = Arc::new(Router::from_config(config)?);
                let app = with_common_layers(router_api::app(router), component, &config.security);
                let listener = bind(component, &config.router.bind_address).await?;
                let rx = shutdown.subscribe();
                pending.push((component, serve(listener, app, component, rx).boxed()));
            }
            Component::Relay => {
                let next = upstream(component, &config.relay.router_url)?;
                tracing::info!(router = %next.base(), "Relay forwarding to router");
                let app = with_common_layers(relay::app(next), component, &config.security);
                let listener = bind(component, &config.relay.bind_address).await?;
                let rx = shutdown.subscribe();
                pending.push((component, serve(listener, app, component, rx).boxed()));
            }
            Component::Gateway => {
                let next = upstream(component, &config.gateway.relay_url)?;
                tracing::info!(relay = %next.base(), "Gateway forwarding to relay");
                let secret = SharedSecret::new(config.gateway.password.clone());
                let app = with_common_layers(gateway::app(next, secret), component, &config.security);

                let rustls = match &config.gateway.tls {
                    Some(tls) => Some(
                        load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path))
                            .await
                            .map_err(StartupError::Tls)?,
                    ),
                    None => None,
                };
                let listener = bind(component, &config.gateway.bind_address).await?;
                let rx = shutdown.subscribe();

                let server = match rustls {
                    Some(rustls) => serve_tls(listener, rustls, app, component, rx).boxed(),
                    None => serve(listener, app, component, rx).boxed(),
                };
                pending.push((component, server));
            }
        }
    }

    Ok(pending)
}

/// Run `components` until `shutdown` fires or one of them fails.
pub async fn run(
    config: &GatekeeperConfig,
    components: &[Component],
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let pending = prepare(config, components, shutdown).await?;

    let mut tasks: JoinSet<(Component, std::io::Result<()>)> = JoinSet::new();
    for (component, server) in pending {
        tasks.spawn(async move { (component, server.await) });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let (component, result) = joined?;
        if let Err(source) = result {
            tracing::error!(component = %component, error = %source, "Server exited with error");
            // One hop down breaks the chain; stop the others.
            shutdown.trigger();
            first_error.get_or_insert(StartupError::Serve { component, source });
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointConfig, TlsConfig};

    fn chain_config() -> GatekeeperConfig {
        let mut config = GatekeeperConfig::default();
        config.cluster.primary = EndpointConfig { host: "db0".into(), port: 3306 };
        config.router.bind_address = "127.0.0.1:0".into();
        config.relay.bind_address = "127.0.0.1:0".into();
        config.gateway.bind_address = "127.0.0.1:0".into();
        config.gateway.password = "password".into();
        config
    }

    #[tokio::test]
    async fn test_prepare_binds_every_component() {
        let shutdown = Shutdown::new();
        let all = [Component::Router, Component::Relay, Component::Gateway];
        let pending = prepare(&chain_config(), &all, &shutdown).await.unwrap();

        let components: Vec<_> = pending.iter().map(|(c, _)| *c).collect();
        assert_eq!(components, all);
    }

    #[tokio::test]
    async fn test_missing_certificate_fails_before_serving() {
        let shutdown = Shutdown::new();
        let mut config = chain_config();
        config.gateway.tls = Some(TlsConfig {
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
        });

        let err = prepare(&config, &[Component::Router, Component::Gateway], &shutdown)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::Tls(_)));
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported_per_component() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = Shutdown::new();
        let mut config = chain_config();
        config.relay.bind_address = taken.local_addr().unwrap().to_string();

        let err = prepare(&config, &[Component::Router, Component::Relay], &shutdown)
            .await
            .err()
            .unwrap();
        match err {
            StartupError::Bind { component, .. } => assert_eq!(component, Component::Relay),
            other => panic!("unexpected error: {}", other),
        }
    }
}
