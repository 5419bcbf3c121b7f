//! HTTP client for the upstream API.

use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::metrics;

use super::types::UpstreamSnapshot;
use super::USER_AGENT;

/// Client performing the single outbound GET.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// URL requested on every fetch.
    url: String,
}

impl UpstreamClient {
    /// Create a client from upstream settings.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = Self::http_builder(config)
            .build()
            .map_err(UpstreamError::ClientBuild)?;

        Ok(Self::with_http(http, config.url.clone()))
    }

    /// HTTP client builder carrying the upstream settings.
    pub fn http_builder(config: &UpstreamConfig) -> reqwest::ClientBuilder {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if config.insecure_tls {
            warn!(url = %config.url, "Certificate validation DISABLED for upstream requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// URL requested by [`fetch`](Self::fetch).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the upstream URL and capture status and headers.
    ///
    /// Any HTTP status counts as success; only transport failures
    /// (DNS, connect, TLS, timeout, truncated body) are errors.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<UpstreamSnapshot, UpstreamError> {
        let start = Instant::now();
        let result = self.request().await;
        metrics::record_upstream_latency(start);

        match result {
            Ok(snapshot) => {
                debug!(
                    status = snapshot.status,
                    headers = snapshot.headers.len(),
                    "Upstream responded"
                );
                Ok(snapshot)
            }
            Err(e) => {
                metrics::record_upstream_failure();
                Err(e)
            }
        }
    }

    async fn request(&self) -> Result<UpstreamSnapshot, UpstreamError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(UpstreamError::request)?;

        let snapshot = UpstreamSnapshot::new(response.status().as_u16(), response.headers());

        // Drain the body so a connection dropped mid-response surfaces as a failure.
        response.bytes().await.map_err(UpstreamError::request)?;

        Ok(snapshot)
    }
}
