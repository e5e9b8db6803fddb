//! Action registration and the per-action request pipeline.
//!
//! Every action route is wrapped so that the API version is negotiated before
//! the handler runs and the response is JSONP-wrapped afterwards when asked.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{RawPathParams, State, rejection::RawPathParamsRejection},
    http::Request,
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use metrics::counter;
use tracing::{debug, instrument};

use crate::application::controller::ControllerConfig;
use crate::cache::CacheEngine;
use crate::domain::version::{ApiVersion, VersionError};

use super::api::error::ApiError;
use super::jsonp;

pub(crate) const METRIC_INVALID_VERSION: &str = "satchel_invalid_version_total";
pub const VERSION_HEADER: &str = "x-api-version";
pub const VERSION_PATH_PARAM: &str = "version";

/// Per-request view of the action being served, inserted into request
/// extensions by the pipeline and consumed by [`super::Responder`].
#[derive(Clone)]
pub struct ActionContext {
    pub action: Arc<str>,
    pub version: ApiVersion,
    pub config: Arc<ControllerConfig>,
    pub cache: CacheEngine,
}

/// Attached to every action response so request logging can name what
/// served it. `version` is `None` when negotiation failed.
#[derive(Debug, Clone)]
pub struct ServedAction {
    pub action: Arc<str>,
    pub version: Option<ApiVersion>,
}

#[derive(Clone)]
struct ActionState {
    action: Arc<str>,
    config: Arc<ControllerConfig>,
    cache: CacheEngine,
}

/// Builder registering named actions under one shared [`ControllerConfig`].
pub struct Controller<S = ()> {
    config: Arc<ControllerConfig>,
    cache: CacheEngine,
    router: Router<S>,
}

impl<S> Controller<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(config: ControllerConfig, cache: CacheEngine) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            router: Router::new(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Register `route` at `path` as the action called `name`.
    pub fn action(mut self, path: &str, name: &str, route: MethodRouter<S>) -> Self {
        let state = ActionState {
            action: Arc::from(name),
            config: Arc::clone(&self.config),
            cache: self.cache.clone(),
        };
        self.router = self
            .router
            .route(path, route.layer(from_fn_with_state(state, action_pipeline)));
        self
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}

#[instrument(skip_all, fields(action = %action.action, path = %request.uri().path()))]
async fn action_pipeline(
    State(action): State<ActionState>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let callback = jsonp::requested_callback(&request, &action.config.jsonp, &action.action);

    let path_version = params.ok().and_then(|params| {
        params
            .iter()
            .find(|(key, _)| *key == VERSION_PATH_PARAM)
            .map(|(_, value)| value.to_string())
    });
    let token = path_version.or_else(|| {
        request
            .headers()
            .get(VERSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    let negotiated = negotiate(&action.config, token.as_deref());
    let version = negotiated.as_ref().ok().copied();
    let mut response = match negotiated {
        Ok(version) => {
            request.extensions_mut().insert(ActionContext {
                action: Arc::clone(&action.action),
                version,
                config: Arc::clone(&action.config),
                cache: action.cache.clone(),
            });
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    };
    response.extensions_mut().insert(ServedAction {
        action: Arc::clone(&action.action),
        version,
    });

    match callback {
        Some(callback) => {
            jsonp::wrap_response(response, &callback, action.config.show_exception_message)
                .await
        }
        None => response,
    }
}

fn negotiate(config: &ControllerConfig, token: Option<&str>) -> Result<ApiVersion, VersionError> {
    config.version.matches(token).inspect_err(|err| {
        counter!(METRIC_INVALID_VERSION).increment(1);
        debug!(token = token.unwrap_or(""), error = %err, "rejected api version");
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        http::{StatusCode, header},
        routing::get,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::application::controller::JsonpOptions;
    use crate::cache::MemoryKeyStore;
    use crate::domain::version::VersionSpec;

    async fn current_version(Extension(context): Extension<ActionContext>) -> String {
        format!("{}:{}", context.action, context.version)
    }

    fn controller(config: ControllerConfig) -> Router {
        Controller::new(config, CacheEngine::new(Arc::new(MemoryKeyStore::default())))
            .action("/{version}/current", "current", get(current_version))
            .action("/current", "current_header", get(current_version))
            .into_router()
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn version_from_path_reaches_handler() {
        let config = ControllerConfig::default().with_version(VersionSpec::new(1..=2));
        let (status, body) = call(controller(config), get_request("/2/current")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "current:2");
    }

    #[tokio::test]
    async fn version_from_header_when_path_has_none() {
        let request = Request::builder()
            .uri("/current")
            .header(VERSION_HEADER, "1")
            .body(Body::empty())
            .expect("request");
        let (status, body) = call(controller(ControllerConfig::default()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "current_header:1");
    }

    #[tokio::test]
    async fn unsupported_version_is_rejected_before_handler() {
        let (status, body) =
            call(controller(ControllerConfig::default()), get_request("/3/current")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(r#""error":"invalid_version""#));
    }

    #[tokio::test]
    async fn missing_version_is_rejected() {
        let (status, body) =
            call(controller(ControllerConfig::default()), get_request("/current")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid_version"));
    }

    #[tokio::test]
    async fn responses_name_the_serving_action() {
        let config = ControllerConfig::default().with_version(VersionSpec::new(1..=2));
        let router = controller(config);

        let served = router
            .clone()
            .oneshot(get_request("/2/current"))
            .await
            .expect("router responds");
        let served = served
            .extensions()
            .get::<ServedAction>()
            .expect("served action attached");
        assert_eq!(&*served.action, "current");
        assert_eq!(served.version, Some(ApiVersion(2)));

        let rejected = router
            .oneshot(get_request("/7/current"))
            .await
            .expect("router responds");
        let rejected = rejected
            .extensions()
            .get::<ServedAction>()
            .expect("served action attached");
        assert_eq!(rejected.version, None);
    }

    #[tokio::test]
    async fn version_errors_are_wrapped_for_jsonp() {
        let config = ControllerConfig::default().jsonp(JsonpOptions::default());
        let response = controller(config)
            .oneshot(get_request("/9/current?callback=handle"))
            .await
            .expect("router responds");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            jsonp::JAVASCRIPT_CONTENT_TYPE
        );
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect")
            .to_bytes();
        let body = String::from_utf8_lossy(&bytes);
        assert!(body.starts_with("handle({\"error\":\"invalid_version\""));
        assert!(body.ends_with("});"));
    }
}
