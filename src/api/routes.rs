//! HTTP API route definitions.

use std::future::Future;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::Result;

use super::handlers::{
    fetch_data, health, home, process, AppState, ROUTE_FETCH_DATA, ROUTE_HEALTH, ROUTE_HOME,
    ROUTE_PROCESS,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = match state.body_limit {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route(ROUTE_HOME, get(home))
        .route(ROUTE_HEALTH, get(health))
        .route(ROUTE_FETCH_DATA, get(fetch_data))
        .route(ROUTE_PROCESS, post(process))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on a bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::upstream::{UpstreamClient, HTTP_CLIENT_VERSION};

    /// State whose upstream is a closed local port.
    fn unreachable_state() -> AppState {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        AppState::new(UpstreamClient::with_http(http, "http://127.0.0.1:1/"))
    }

    async fn send(request: Request<Body>) -> Response {
        send_with(unreachable_state(), request).await
    }

    async fn send_with(state: AppState, request: Request<Body>) -> Response {
        create_router(state).oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn home_endpoint_returns_banner() {
        let response = send(get_request("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            body_json(response).await,
            json!({"message": "Security Vulnerability Demo App", "status": "running"})
        );
    }

    #[tokio::test]
    async fn home_and_health_are_idempotent() {
        for uri in ["/", "/health"] {
            let first = body_json(send(get_request(uri)).await).await;
            let second = body_json(send(get_request(uri)).await).await;
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn health_endpoint_returns_healthy() {
        let response = send(get_request("/health")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn process_reports_canonical_size() {
        let response = send(post_json(r#"{"test":"data","number":123}"#)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "processed": true,
                "input_size": r#"{"test": "data", "number": 123}"#.len(),
                "urllib3_version": HTTP_CLIENT_VERSION,
            })
        );
    }

    #[tokio::test]
    async fn process_size_ignores_raw_whitespace() {
        let response = send(post_json("  {\n  \"a\" :   1\n}  ")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["input_size"], json!(8));
    }

    #[tokio::test]
    async fn process_accepts_body_over_two_megabytes() {
        let filler = "a".repeat(3 * 1024 * 1024);
        let response = send(post_json(format!(r#"{{"k":"{}"}}"#, filler))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["input_size"],
            json!(filler.len() + r#"{"k": ""}"#.len())
        );
    }

    #[tokio::test]
    async fn process_over_configured_limit_is_json() {
        let state = unreachable_state().with_body_limit(Some(16));
        let request = post_json(r#"{"key": "longer than sixteen bytes"}"#);
        let response = send_with(state, request).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn process_accepts_lone_surrogate() {
        let response = send(post_json(r#"{"a":"\ud800"}"#)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["input_size"],
            json!(r#"{"a": "\ud800"}"#.len())
        );
    }

    #[tokio::test]
    async fn process_keeps_big_integers_exact() {
        let response = send(post_json(r#"{"n":100000000000000000000,"z":-0}"#)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["input_size"],
            json!(r#"{"n": 100000000000000000000, "z": 0}"#.len())
        );
    }

    #[tokio::test]
    async fn process_accepts_empty_object() {
        let response = send(post_json("{}")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["processed"], json!(true));
        assert_eq!(body["input_size"], json!(2));
    }

    #[tokio::test]
    async fn process_without_body_is_rejected() {
        let response = send(post_json("")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "No data provided"})
        );
    }

    #[tokio::test]
    async fn process_with_invalid_json_is_rejected() {
        let response = send(post_json("{not json")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "No data provided"})
        );
    }

    #[tokio::test]
    async fn process_with_null_is_rejected() {
        let response = send(post_json("null")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn process_without_json_content_type_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/process")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(r#"{"a": 1}"#))
            .unwrap();

        let response = send(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "No data provided"})
        );
    }

    #[tokio::test]
    async fn process_rejects_get() {
        let response = send(get_request("/process")).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn fetch_data_reports_unreachable_upstream() {
        let response = send(get_request("/fetch-data")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(!object["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = send(get_request("/missing")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
