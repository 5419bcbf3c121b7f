//! Application configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in bytes. Unset means unlimited.
    #[serde(default)]
    pub max_body_bytes: Option<usize>,

    // === Upstream Configuration ===
    /// Target of the `/fetch-data` outbound call.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Overall timeout for the outbound call. Unset means no timeout.
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,

    /// Skip certificate validation on the outbound call.
    ///
    /// Insecure; only meant for parity testing against the legacy service.
    #[serde(default)]
    pub upstream_insecure_tls: bool,

    // === Observability ===
    /// Port for the Prometheus exporter. Unset disables it.
    ///
    /// The exporter binds to `HOST`, so with the default `0.0.0.0` metrics are
    /// reachable on every interface.
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

/// Subset of [`Config`] needed to build the upstream client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// URL requested by the outbound call.
    pub url: String,
    /// Optional overall request timeout.
    pub timeout: Option<Duration>,
    /// Disable certificate validation.
    pub insecure_tls: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_upstream_url() -> String {
    "https://api.github.com".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: None,
            upstream_url: default_upstream_url(),
            upstream_timeout_secs: None,
            upstream_insecure_tls: false,
            metrics_port: None,
            log_format: default_log_format(),
            rust_log: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.host.parse::<IpAddr>().is_err() {
            return Err(format!("HOST must be an IP address, got {:?}", self.host));
        }

        match Url::parse(&self.upstream_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(format!(
                    "UPSTREAM_URL must use http or https, got {}",
                    url.scheme()
                ))
            }
            Err(e) => return Err(format!("UPSTREAM_URL is invalid: {}", e)),
        }

        if self.max_body_bytes == Some(0) {
            return Err("MAX_BODY_BYTES must be greater than 0".to_string());
        }

        if self.upstream_timeout_secs == Some(0) {
            return Err("UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string());
        }

        if self.metrics_port == Some(self.port) {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err("LOG_FORMAT must be text or json".to_string());
        }

        Ok(())
    }

    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            AppError::InvalidConfig(format!("HOST must be an IP address, got {:?}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Socket address for the Prometheus exporter, if enabled. Shares `HOST`
    /// with the service.
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        let ip: IpAddr = self.host.parse().ok()?;
        self.metrics_port.map(|port| SocketAddr::new(ip, port))
    }

    /// Check if logs should be emitted as JSON.
    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }

    /// Settings for the outbound client.
    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            url: self.upstream_url.clone(),
            timeout: self.upstream_timeout_secs.map(Duration::from_secs),
            insecure_tls: self.upstream_insecure_tls,
        }
    }
}
