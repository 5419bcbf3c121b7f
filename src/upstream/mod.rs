//! Outbound call to the third-party API behind `/fetch-data`.
//!
//! This module handles:
//! - Building the HTTP client (certificate validation on unless configured off)
//! - Performing the single GET and capturing status and headers
//! - Response types for the endpoint body

pub mod client;
pub mod types;

pub use client::UpstreamClient;
pub use types::{FetchResponse, UpstreamSnapshot};

/// Version of the outbound HTTP client library, resolved at build time.
pub const HTTP_CLIENT_VERSION: &str = env!("HTTP_CLIENT_VERSION");

/// User agent sent on outbound requests.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
