#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use satchel::application::controller::ControllerConfig;
use satchel::cache::{CacheEngine, KeyStore, MemoryKeyStore};
use satchel::infra::http::{self, ApiState};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: ApiState,
    pub store: Arc<MemoryKeyStore>,
}

/// Router over three seeded widgets (`sprocket`, `flange`, `grommet`).
pub fn app(root: ControllerConfig) -> TestApp {
    let store = Arc::new(MemoryKeyStore::default());
    let state = app_state(store.clone());
    TestApp {
        router: http::build_router(state.clone(), &root),
        state,
        store,
    }
}

pub fn app_with_store(root: ControllerConfig, store: Arc<dyn KeyStore>) -> Router {
    let state = app_state(store);
    http::build_router(state, &root)
}

fn app_state(store: Arc<dyn KeyStore>) -> ApiState {
    let state = ApiState::new(CacheEngine::new(store));
    for name in ["sprocket", "flange", "grommet"] {
        state.widgets.insert(name);
    }
    state
}

pub fn caching_enabled() -> ControllerConfig {
    let mut config = ControllerConfig::default();
    config.caching.enabled = true;
    config
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).expect("utf8 body"),
    }
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, request(Method::GET, uri, &[], Body::empty())).await
}

pub fn request(
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body).expect("request should build")
}

pub fn json_body(value: &str) -> Body {
    Body::from(value.to_string())
}
