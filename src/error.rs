//! Unified error types for the demo service.

use std::error::Error as StdError;

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup and process-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Upstream client could not be constructed.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the outbound call behind `/fetch-data`.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request failed before a response arrived (DNS, connect, TLS, timeout).
    #[error("{message}")]
    Request {
        /// Error description including its causes.
        message: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// Wrap a client error, flattening its cause chain into the message.
    pub fn request(source: reqwest::Error) -> Self {
        Self::Request {
            message: describe_chain(&source),
            source,
        }
    }

    /// Check if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ClientBuild(_) => false,
            Self::Request { source, .. } => source.is_timeout(),
        }
    }
}

/// Render an error followed by each of its sources, separated by `": "`.
fn describe_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Errors returned from HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body missing, not JSON, or JSON `null`.
    #[error("No data provided")]
    NoData,

    /// Request body could not be read (e.g. over the configured size limit).
    #[error("{message}")]
    Body {
        /// Status chosen by the body extractor.
        status: StatusCode,
        /// Rejection text.
        message: String,
    },

    /// Payload could not be re-encoded.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// Outbound call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoData => StatusCode::BAD_REQUEST,
            Self::Body { status, .. } => *status,
            Self::Encode(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
