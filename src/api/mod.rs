//! HTTP API module: status, health, upstream fetch and JSON processing.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{create_router, serve};
