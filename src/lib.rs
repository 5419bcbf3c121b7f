//! Minimal JSON web service used to exercise dependency vulnerability
//! scanning in CI.
//!
//! Four routes, each a direct request-to-response mapping:
//!
//! ```text
//! GET  /            -> {"message": "Security Vulnerability Demo App", "status": "running"}
//! GET  /health      -> {"status": "healthy"}
//! GET  /fetch-data  -> upstream status and headers, or 500 {"error": ...}
//! POST /process     -> canonical size of the JSON body, or 400 {"error": "No data provided"}
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`api`]: Router and handlers
//! - [`upstream`]: Outbound call behind `/fetch-data`
//! - [`canonical`]: Canonical JSON re-encoding
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod canonical;
pub mod config;
pub mod error;
pub mod metrics;
pub mod upstream;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
