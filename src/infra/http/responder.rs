//! Handler-facing response builder.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::controller::ControllerConfig;
use crate::application::envelope::{ExposeOptions, Shape};
use crate::cache::{CacheEngine, EntityTag, normalise_etag};
use crate::domain::exposed::Exposed;
use crate::domain::version::ApiVersion;

use super::api::error::ApiError;
use super::controller::ActionContext;

const JSON_CONTENT_TYPE: &str = "application/json";
pub(crate) const METRIC_NOT_MODIFIED: &str = "satchel_not_modified_total";

/// Extracted by handlers registered through [`super::Controller`].
pub struct Responder {
    context: ActionContext,
    method: Method,
    if_none_match: Vec<EntityTag>,
}

impl<S> FromRequestParts<S> for Responder
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<ActionContext>()
            .cloned()
            .ok_or_else(|| ApiError::system(&MissingActionContext, false))?;

        Ok(Self {
            context,
            method: parts.method.clone(),
            if_none_match: if_none_match(&parts.headers),
        })
    }
}

#[derive(Debug, Error)]
#[error("handler is not registered as a controller action")]
struct MissingActionContext;

impl Responder {
    pub fn action(&self) -> &str {
        &self.context.action
    }

    pub fn version(&self) -> ApiVersion {
        self.context.version
    }

    pub fn config(&self) -> &Arc<ControllerConfig> {
        &self.context.config
    }

    /// Engine for recording or invalidating fingerprints after writes.
    pub fn cache(&self) -> &CacheEngine {
        &self.context.cache
    }

    /// Render `object` as an envelope, applying the action's caching rules.
    pub fn expose(&self, object: &dyn Exposed, options: ExposeOptions) -> Response {
        self.try_expose(object, options)
            .unwrap_or_else(IntoResponse::into_response)
    }

    pub fn try_expose(
        &self,
        object: &dyn Exposed,
        options: ExposeOptions,
    ) -> Result<Response, ApiError> {
        let config = &self.context.config;
        let show = config.show_exception_message;

        let (shape, envelope) = config
            .envelope_builder()
            .expose(object, &options)
            .map_err(|err| ApiError::expose(&err, show))?;

        let mut headers = HeaderMap::new();
        if self.caches_response(options.status)
            && let Some(response) = self.apply_caching(object, shape, &mut headers)
        {
            return Ok(response);
        }

        let body = serde_json::to_vec(&envelope).map_err(|err| ApiError::system(&err, show))?;
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or(JSON_CONTENT_TYPE);
        let content_type =
            HeaderValue::from_str(content_type).map_err(|err| ApiError::system(&err, show))?;
        headers.insert(header::CONTENT_TYPE, content_type);

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = options.status;
        response.headers_mut().extend(headers);
        Ok(response)
    }

    /// Empty body with a JSON content type and the given status.
    pub fn no_content(&self, status: StatusCode) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        response
    }

    fn caches_response(&self, status: StatusCode) -> bool {
        status.is_success()
            && (self.method == Method::GET || self.method == Method::HEAD)
            && self.context.config.caching.applies_to(&self.context.action)
    }

    /// Adds `ETag` (singular) or `Cache-Control` (collections). Returns a
    /// `304` when the client already holds the current ETag.
    ///
    /// Runs only after version negotiation and the handler, so a validator
    /// is only ever compared against the resource this action rendered.
    fn apply_caching(
        &self,
        object: &dyn Exposed,
        shape: Shape,
        headers: &mut HeaderMap,
    ) -> Option<Response> {
        if !shape.is_singular() {
            let cache_control = self.context.config.caching.cache_control();
            if let Ok(value) = HeaderValue::from_str(&cache_control) {
                headers.insert(header::CACHE_CONTROL, value);
            }
            return None;
        }

        let etag = match self.context.cache.etag_for(object) {
            Ok(etag) => etag,
            Err(err) => {
                warn!(
                    action = %self.context.action,
                    error = %err,
                    outcome = "degraded",
                    "key store unavailable, responding without etag"
                );
                return None;
            }
        };

        if self
            .if_none_match
            .iter()
            .any(|tag| tag.to_string() == etag)
        {
            debug!(action = %self.context.action, outcome = "not_modified", "etag matched");
            return Some(not_modified(&normalise_etag(&etag)));
        }

        if let Ok(value) = HeaderValue::from_str(&normalise_etag(&etag)) {
            headers.insert(header::ETAG, value);
        }
        None
    }
}

/// Empty `304` carrying `etag`.
fn not_modified(etag: &str) -> Response {
    counter!(METRIC_NOT_MODIFIED).increment(1);
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    if let Ok(value) = HeaderValue::from_str(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

fn if_none_match(headers: &HeaderMap) -> Vec<EntityTag> {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(EntityTag::parse_list)
        .collect()
}
