//! Built-in health sources declared in configuration.
//!
//! # Responsibilities
//! - TCP connect probe
//! - HTTP GET probe (2xx is UP)
//! - Static status (maintenance flags)
//! - Build the source list from `[[sources]]`
//!
//! # Design Decisions
//! - An unreachable dependency is a DOWN result, not a probe error; errors
//!   are reserved for targets that cannot be probed at all
//! - No timeouts here: the poller bounds every evaluation

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpStream;

use crate::config::{ProbeConfig, SourceConfig};
use crate::error::ProbeError;
use crate::health::source::{HealthSource, HealthSourceId};
use crate::health::status::{Health, HealthStatus};

/// UP when a TCP connection to `address` can be established.
pub struct TcpSource {
    address: String,
}

impl TcpSource {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl HealthSource for TcpSource {
    async fn health(&self) -> Result<Health, ProbeError> {
        let health = match TcpStream::connect(&self.address).await {
            Ok(_) => Health::up(),
            Err(e) => Health::down().with_detail("error", e.to_string()),
        };
        Ok(health.with_detail("address", self.address.clone()))
    }
}

/// UP when a GET to `url` answers with a 2xx status.
pub struct HttpSource {
    url: String,
    client: Client<HttpConnector, Body>,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl HealthSource for HttpSource {
    async fn health(&self) -> Result<Health, ProbeError> {
        let request = Request::builder()
            .method("GET")
            .uri(self.url.as_str())
            .header("user-agent", "health-bridge")
            .body(Body::empty())
            .map_err(|e| ProbeError::InvalidTarget(format!("{}: {}", self.url, e)))?;

        let health = match self.client.request(request).await {
            Ok(response) => {
                let status = response.status();
                let health = if status.is_success() {
                    Health::up()
                } else {
                    Health::down()
                };
                health.with_detail("status_code", status.as_u16())
            }
            Err(e) => Health::down().with_detail("error", e.to_string()),
        };
        Ok(health.with_detail("url", self.url.clone()))
    }
}

/// Always reports the configured status.
pub struct StaticSource {
    status: HealthStatus,
}

impl StaticSource {
    pub fn new(status: HealthStatus) -> Self {
        Self { status }
    }
}

#[async_trait]
impl HealthSource for StaticSource {
    async fn health(&self) -> Result<Health, ProbeError> {
        Ok(Health::new(self.status))
    }
}

/// Build the configured sources, in declaration order.
pub fn build_sources(configs: &[SourceConfig]) -> Vec<(HealthSourceId, Arc<dyn HealthSource>)> {
    configs
        .iter()
        .map(|config| {
            let source: Arc<dyn HealthSource> = match &config.probe {
                ProbeConfig::Tcp { address } => Arc::new(TcpSource::new(address.clone())),
                ProbeConfig::Http { url } => Arc::new(HttpSource::new(url.clone())),
                ProbeConfig::Static { status } => Arc::new(StaticSource::new(*status)),
            };
            (HealthSourceId::new(config.name.clone()), source)
        })
        .collect()
}
