//! Upstream response types.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::Serialize;

/// Label reported in the `source` field.
pub const SOURCE_LABEL: &str = "GitHub API";

/// What the endpoint keeps from an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSnapshot {
    /// Upstream HTTP status code.
    pub status: u16,
    /// Header names mapped to their values.
    pub headers: BTreeMap<String, String>,
}

impl UpstreamSnapshot {
    /// Capture status and headers.
    pub fn new(status: u16, headers: &HeaderMap) -> Self {
        Self {
            status,
            headers: fold_headers(headers),
        }
    }
}

/// Flatten a header map, joining repeated fields with `", "`.
pub fn fold_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut folded: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        folded
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    folded
}

/// Body of a successful `/fetch-data` response.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// Fixed source label.
    pub source: &'static str,
    /// Upstream HTTP status code.
    pub status: u16,
    /// Upstream response headers.
    pub headers: BTreeMap<String, String>,
}

impl From<UpstreamSnapshot> for FetchResponse {
    fn from(snapshot: UpstreamSnapshot) -> Self {
        Self {
            source: SOURCE_LABEL,
            status: snapshot.status,
            headers: snapshot.headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let folded = fold_headers(&headers);

        assert_eq!(folded.len(), 2);
        assert_eq!(folded["set-cookie"], "a=1, b=2");
        assert_eq!(folded["content-type"], "application/json");
    }

    #[test]
    fn non_utf8_values_are_decoded_lossily() {
        let mut headers = HeaderMap::new();
        headers.insert("x-raw", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let folded = fold_headers(&headers);

        assert_eq!(folded["x-raw"], "caf\u{fffd}");
    }

    #[test]
    fn fetch_response_carries_source_label() {
        let snapshot = UpstreamSnapshot::new(204, &HeaderMap::new());
        let body = serde_json::to_value(FetchResponse::from(snapshot)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({"source": "GitHub API", "status": 204, "headers": {}})
        );
    }
}
