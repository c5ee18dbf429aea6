//! Forwarding to the next hop.
//!
//! # Responsibilities
//! - Send a request body verbatim to the next hop
//! - Propagate the request ID, and nothing else from the caller's headers
//! - Hand the downstream status and body back unchanged
//!
//! # Design Decisions
//! - No retries and no timeout beyond the transport default
//! - Only a failure to reach the next hop is reported by this hop
//!   (UpstreamTransportFailure); downstream errors pass through as-is

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request},
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::error::GatekeeperError;
use crate::http::request::X_REQUEST_ID;

/// HTTP client bound to the next hop's base URL.
#[derive(Clone, Debug)]
pub struct Upstream {
    base: Url,
    client: Client<HttpConnector, Body>,
}

impl Upstream {
    /// A path prefix on `base` (`http://host/relay`) is kept for every
    /// forwarded path.
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Full URL for `path` beneath the base.
    pub fn target(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path.trim_start_matches('/'))
    }

    /// Forward `body` to `path` on the next hop.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        incoming: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, GatekeeperError> {
        let target = self
            .target(path)
            .map_err(|e| GatekeeperError::UpstreamTransportFailure(e.to_string()))?;

        let mut builder = Request::builder().method(method).uri(target.as_str());
        if let Some(id) = incoming.get(&X_REQUEST_ID) {
            builder = builder.header(&X_REQUEST_ID, id.clone());
        }
        if !body.is_empty() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }

        let request = builder
            .body(Body::from(body))
            .map_err(|e| GatekeeperError::UpstreamTransportFailure(e.to_string()))?;

        match self.client.request(request).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Err(e) => {
                tracing::error!(target = %target, error = %e, "Upstream error");
                Err(GatekeeperError::UpstreamTransportFailure(format!(
                    "{}: {}",
                    target, e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base() {
        assert!(Upstream::new("not a url").is_err());
        assert_eq!(
            Upstream::new("http://10.0.0.5:5001").unwrap().base().as_str(),
            "http://10.0.0.5:5001/"
        );
    }

    #[test]
    fn test_path_prefix_is_kept() {
        let upstream = Upstream::new("http://10.0.0.5:5001/relay").unwrap();
        assert_eq!(upstream.target("/query").unwrap().as_str(), "http://10.0.0.5:5001/relay/query");

        let upstream = Upstream::new("http://10.0.0.5:5001/relay/").unwrap();
        assert_eq!(upstream.target("/mode").unwrap().as_str(), "http://10.0.0.5:5001/relay/mode");

        let upstream = Upstream::new("http://10.0.0.5:5001").unwrap();
        assert_eq!(upstream.target("/query").unwrap().as_str(), "http://10.0.0.5:5001/query");
    }

    #[tokio::test]
    async fn test_unreachable_next_hop() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = Upstream::new(&format!("http://{}", addr)).unwrap();
        let err = upstream
            .forward(Method::GET, "/mode", &HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatekeeperError::UpstreamTransportFailure(_)));
    }
}
