pub mod api;
mod controller;
mod jsonp;
mod middleware;
mod responder;

pub use api::{ApiState, build_api_router};
pub use controller::{
    ActionContext, Controller, ServedAction, VERSION_HEADER, VERSION_PATH_PARAM,
};
pub use jsonp::{JAVASCRIPT_CONTENT_TYPE, is_valid_callback, wrap_body};
pub use middleware::{REQUEST_ID_HEADER, RequestContext, log_responses, set_request_context};
pub use responder::Responder;

use axum::{
    Router,
    http::Uri,
    middleware::from_fn,
    response::{IntoResponse, Response},
};

use crate::application::controller::ControllerConfig;

use api::error::ApiError;

/// Full application router: demo controllers plus the shared middleware stack.
pub fn build_router(state: ApiState, root: &ControllerConfig) -> Router {
    build_api_router(&state, root)
        .fallback(fallback)
        .with_state(state)
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
}

async fn fallback(uri: Uri) -> Response {
    ApiError::not_found(format!("no route matches `{}`", uri.path())).into_response()
}
