//! HTTP API handlers.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::canonical;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::metrics;
use crate::upstream::{FetchResponse, UpstreamClient, HTTP_CLIENT_VERSION};

/// Route paths, also used as metric labels.
pub const ROUTE_HOME: &str = "/";
pub const ROUTE_HEALTH: &str = "/health";
pub const ROUTE_FETCH_DATA: &str = "/fetch-data";
pub const ROUTE_PROCESS: &str = "/process";

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for the `/fetch-data` outbound call.
    pub upstream: UpstreamClient,
    /// Outbound client library version reported by `/process`.
    pub client_version: &'static str,
    /// Request body size limit in bytes. `None` means unlimited.
    pub body_limit: Option<usize>,
}

impl AppState {
    /// Create new app state.
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            upstream,
            client_version: HTTP_CLIENT_VERSION,
            body_limit: None,
        }
    }

    /// Set the request body size limit.
    pub fn with_body_limit(mut self, limit: Option<usize>) -> Self {
        self.body_limit = limit;
        self
    }

    /// Build app state from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = UpstreamClient::new(&config.upstream())?;
        Ok(Self::new(upstream).with_body_limit(config.max_body_bytes))
    }
}

/// Home response.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    /// Service banner.
    pub message: &'static str,
    /// Always "running".
    pub status: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy".
    pub status: &'static str,
}

/// Result of `/process`.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// Always true.
    pub processed: bool,
    /// Byte length of the canonical re-encoding of the input.
    pub input_size: usize,
    /// Outbound HTTP client library version.
    #[serde(rename = "urllib3_version")]
    pub client_version: &'static str,
}

/// Home handler - service banner.
pub async fn home() -> Json<HomeResponse> {
    metrics::record_request(ROUTE_HOME);
    Json(HomeResponse {
        message: "Security Vulnerability Demo App",
        status: "running",
    })
}

/// Health check handler - always returns 200.
pub async fn health() -> Json<HealthResponse> {
    metrics::record_request(ROUTE_HEALTH);
    Json(HealthResponse { status: "healthy" })
}

/// Fetch handler - reports upstream status and headers, 500 on transport failure.
pub async fn fetch_data(
    State(state): State<AppState>,
) -> std::result::Result<Json<FetchResponse>, ApiError> {
    metrics::record_request(ROUTE_FETCH_DATA);

    match state.upstream.fetch().await {
        Ok(snapshot) => Ok(Json(FetchResponse::from(snapshot))),
        Err(e) => {
            warn!(
                url = %state.upstream.url(),
                timeout = e.is_timeout(),
                error = %e,
                "Upstream fetch failed"
            );
            Err(e.into())
        }
    }
}

/// Process handler - sizes the canonical re-encoding of a JSON body.
pub async fn process(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<ProcessResponse>, ApiError> {
    metrics::record_request(ROUTE_PROCESS);

    let parsed = body
        .map_err(ApiError::from)
        .and_then(|body| parse_payload(&headers, &body).map(|payload| (payload, body.len())));
    let (payload, raw_bytes) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            metrics::record_process_rejected();
            return Err(e);
        }
    };

    let input_size = canonical::encoded_len(&payload)?;
    metrics::record_process_input(input_size);
    debug!(raw_bytes, input_size, "Processed payload");

    Ok(Json(ProcessResponse {
        processed: true,
        input_size,
        client_version: state.client_version,
    }))
}

/// Decode a request body as JSON.
///
/// Requires a JSON content type and a body that parses to something other
/// than `null`; everything else is [`ApiError::NoData`]. Unpaired surrogate
/// escapes are tolerated.
pub fn parse_payload(headers: &HeaderMap, body: &[u8]) -> std::result::Result<Value, ApiError> {
    if !has_json_content_type(headers) {
        return Err(ApiError::NoData);
    }

    match canonical::from_slice(body) {
        Ok(Value::Null) | Err(_) => Err(ApiError::NoData),
        Ok(value) => Ok(value),
    }
}

/// `application/json` or `application/<anything>+json`, parameters ignored.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json"
        || (mime.starts_with("application/") && mime.ends_with("+json"))
}
