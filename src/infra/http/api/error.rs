use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use satchel_api_types::ErrorBody;

use crate::application::error::ErrorReport;
use crate::domain::error::ExposeError;
use crate::domain::version::VersionError;

const SOURCE: &str = "infra::http::api";
const GENERIC_SYSTEM_MESSAGE: &str = "An unknown error occurred.";

pub mod codes {
    pub const INVALID_VERSION: &str = "invalid_version";
    pub const NOT_FOUND: &str = "not_found";
    pub const BAD_REQUEST: &str = "bad_request";
    pub const SYSTEM: &str = "system";
}

/// Structured API error rendered as `{"error": ..., "error_description": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    description: String,
    detail: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            status,
            code,
            detail: vec![description.clone()],
            description,
        }
    }

    pub fn invalid_version(error: &VersionError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_VERSION, error.to_string())
    }

    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, description)
    }

    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, description)
    }

    /// Internal failure. The underlying message is only shown to clients when
    /// `show_exception_message` is set; the log always receives the full chain.
    pub fn system(error: &dyn StdError, show_exception_message: bool) -> Self {
        let report = ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, error);
        let description = if show_exception_message {
            error.to_string()
        } else {
            GENERIC_SYSTEM_MESSAGE.to_string()
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: codes::SYSTEM,
            description,
            detail: report.messages,
        }
    }

    pub fn expose(error: &ExposeError, show_exception_message: bool) -> Self {
        Self::system(error, show_exception_message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl From<VersionError> for ApiError {
    fn from(error: VersionError) -> Self {
        Self::invalid_version(&error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code.to_string(),
            error_description: Some(self.description),
        };
        let mut response = (self.status, Json(body)).into_response();
        let mut messages = self.detail;
        if let Some(first) = messages.first_mut() {
            *first = format!("{}: {first}", self.code);
        }
        ErrorReport {
            source: SOURCE,
            status: self.status,
            messages,
        }
        .attach(&mut response);
        response
    }
}
