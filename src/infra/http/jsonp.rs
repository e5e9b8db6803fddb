//! JSONP wrapping for JSON responses.
//!
//! Only safe reads are wrapped. The callback name has to look like a
//! JavaScript identifier path, anything else is ignored and the JSON body
//! passes through untouched.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::Query,
    http::{HeaderValue, Method, Request, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use metrics::counter;
use tracing::{debug, warn};

use crate::application::controller::JsonpConfig;

use super::api::error::ApiError;

pub(crate) const METRIC_JSONP_WRAPPED: &str = "satchel_jsonp_wrapped_total";
pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// Whether `name` is usable as a callback: `[A-Za-z_$][A-Za-z0-9_$.]*`.
pub fn is_valid_callback(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '.'))
}

/// `<callback>(<body>);`
pub fn wrap_body(callback: &str, body: &[u8]) -> Bytes {
    let mut wrapped = Vec::with_capacity(callback.len() + body.len() + 3);
    wrapped.extend_from_slice(callback.as_bytes());
    wrapped.push(b'(');
    wrapped.extend_from_slice(body);
    wrapped.extend_from_slice(b");");
    Bytes::from(wrapped)
}

/// Callback requested for this action, if wrapping applies at all.
pub(crate) fn requested_callback(
    request: &Request<Body>,
    config: &JsonpConfig,
    action: &str,
) -> Option<String> {
    if !config.applies_to(action) {
        return None;
    }
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return None;
    }

    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(request.uri()).ok()?;
    let callback = params.get(&config.parameter)?;
    if is_valid_callback(callback) {
        Some(callback.clone())
    } else {
        debug!(action, callback = %callback, "ignoring unusable jsonp callback");
        None
    }
}

/// Wrap a JSON response body in `callback(...)`, recomputing the length.
///
/// Non-JSON and empty responses are returned unchanged. The JSON
/// representation's `ETag` does not describe the script and is dropped.
pub(crate) async fn wrap_response(
    response: Response,
    callback: &str,
    show_exception_message: bool,
) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match BodyExt::collect(body).await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!(error = %err, "failed to buffer response for jsonp wrapping");
            return ApiError::system(&err, show_exception_message).into_response();
        }
    };
    if bytes.is_empty() {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let wrapped = wrap_body(callback, &bytes);
    parts.headers.remove(header::ETAG);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JAVASCRIPT_CONTENT_TYPE),
    );
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(wrapped.len()));
    counter!(METRIC_JSONP_WRAPPED).increment(1);

    Response::from_parts(parts, Body::from(wrapped))
}

#[cfg(test)]
mod tests {
    use axum::{Json, http::StatusCode};
    use http_body_util::{Full, Limited};
    use serde_json::json;

    use super::*;

    fn enabled() -> JsonpConfig {
        JsonpConfig {
            enabled: true,
            ..JsonpConfig::default()
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn callback_names_follow_identifier_rules() {
        for name in ["test", "_cb", "$", "jQuery123_456", "ns.handlers.done"] {
            assert!(is_valid_callback(name), "rejected `{name}`");
        }
        for name in ["", "1cb", "alert(1)", "a b", "cb;", ".cb"] {
            assert!(!is_valid_callback(name), "accepted `{name}`");
        }
    }

    #[test]
    fn wraps_body_exactly() {
        let wrapped = wrap_body("test", br#"{"response":{"echo":"Hello World"}}"#);
        assert_eq!(
            &wrapped[..],
            br#"test({"response":{"echo":"Hello World"}});"#
        );
    }

    #[test]
    fn callback_read_from_configured_parameter() {
        let config = JsonpConfig {
            parameter: "cb".to_string(),
            ..enabled()
        };
        assert_eq!(
            requested_callback(&get("/echo?cb=done"), &config, "echo"),
            Some("done".to_string())
        );
        assert_eq!(
            requested_callback(&get("/echo?callback=done"), &config, "echo"),
            None
        );
    }

    #[test]
    fn mutating_requests_are_never_wrapped() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/echo?callback=test")
            .body(Body::empty())
            .expect("request");
        assert_eq!(requested_callback(&request, &enabled(), "echo"), None);
    }

    #[test]
    fn disabled_config_ignores_callback() {
        let config = JsonpConfig::default();
        assert_eq!(
            requested_callback(&get("/echo?callback=test"), &config, "echo"),
            None
        );
    }

    #[tokio::test]
    async fn wrap_response_switches_content_type_and_length() {
        let response = Json(json!({"response": {"echo": "Hello World"}})).into_response();
        let wrapped = wrap_response(response, "test", false).await;

        assert_eq!(
            wrapped.headers()[header::CONTENT_TYPE],
            JAVASCRIPT_CONTENT_TYPE
        );
        let expected = r#"test({"response":{"echo":"Hello World"}});"#;
        assert_eq!(
            wrapped.headers()[header::CONTENT_LENGTH],
            expected.len().to_string().as_str()
        );
        let body = wrapped
            .into_body()
            .collect()
            .await
            .expect("collect")
            .to_bytes();
        assert_eq!(&body[..], expected.as_bytes());
    }

    #[tokio::test]
    async fn wrapping_drops_the_json_etag() {
        let mut response = Json(json!({"response": {"id": 1}})).into_response();
        response
            .headers_mut()
            .insert(header::ETAG, HeaderValue::from_static("\"abc:def\""));

        let wrapped = wrap_response(response, "test", false).await;

        assert_eq!(
            wrapped.headers()[header::CONTENT_TYPE],
            JAVASCRIPT_CONTENT_TYPE
        );
        assert!(wrapped.headers().get(header::ETAG).is_none());
    }

    #[tokio::test]
    async fn unreadable_body_becomes_a_system_error() {
        let body = Limited::new(Full::new(Bytes::from_static(br#"{"response":1}"#)), 2);
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::new(body))
            .expect("response");

        let wrapped = wrap_response(response, "test", false).await;

        assert_eq!(wrapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            wrapped.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = wrapped
            .into_body()
            .collect()
            .await
            .expect("collect")
            .to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(body["error"], "system");
        assert_eq!(body["error_description"], "An unknown error occurred.");
    }

    #[tokio::test]
    async fn non_json_responses_pass_through() {
        let response = "plain".into_response();
        let wrapped = wrap_response(response, "test", false).await;
        assert!(
            wrapped.headers()[header::CONTENT_TYPE]
                .to_str()
                .expect("ascii")
                .starts_with("text/plain")
        );
    }
}
