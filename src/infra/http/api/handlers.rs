use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use crate::application::envelope::ExposeOptions;
use crate::domain::page::Page;
use crate::infra::http::Responder;

use super::error::ApiError;
use super::models::{EchoQuery, PageQuery, WidgetRequest};
use super::state::ApiState;

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

pub async fn echo(responder: Responder, Query(query): Query<EchoQuery>) -> Response {
    let echo = query.echo.unwrap_or_default();
    responder.expose(&json!({ "echo": echo }), ExposeOptions::default())
}

pub async fn list_widgets(State(state): State<ApiState>, responder: Responder) -> Response {
    responder.expose(&state.widgets.list(), ExposeOptions::default())
}

pub async fn paged_widgets(
    State(state): State<ApiState>,
    responder: Responder,
    Query(query): Query<PageQuery>,
) -> Response {
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if per_page == 0 || per_page > MAX_PER_PAGE {
        return ApiError::bad_request(format!("per_page must be between 1 and {MAX_PER_PAGE}"))
            .into_response();
    }

    let page = Page::paginate(state.widgets.list(), query.page.unwrap_or(1), per_page);
    responder.expose(&page, ExposeOptions::default())
}

pub async fn show_widget(
    State(state): State<ApiState>,
    responder: Responder,
    path: Result<Path<(String, u64)>, PathRejection>,
) -> Response {
    let id = match widget_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.widgets.get(id) {
        Some(widget) => responder.expose(&widget, ExposeOptions::default()),
        None => widget_not_found(id),
    }
}

pub async fn create_widget(
    State(state): State<ApiState>,
    responder: Responder,
    payload: Result<Json<WidgetRequest>, JsonRejection>,
) -> Response {
    let name = match widget_name(payload) {
        Ok(name) => name,
        Err(response) => return response,
    };

    let widget = state.widgets.insert(name);
    if let Err(err) = responder.cache().record(&widget) {
        warn!(widget_id = widget.id, error = %err, "failed to record widget fingerprint");
    }

    responder.expose(
        &widget,
        ExposeOptions::default().with_status(StatusCode::CREATED),
    )
}

pub async fn update_widget(
    State(state): State<ApiState>,
    responder: Responder,
    path: Result<Path<(String, u64)>, PathRejection>,
    payload: Result<Json<WidgetRequest>, JsonRejection>,
) -> Response {
    let id = match widget_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let name = match widget_name(payload) {
        Ok(name) => name,
        Err(response) => return response,
    };

    let Some(widget) = state.widgets.rename(id, &name) else {
        return widget_not_found(id);
    };

    if let Err(err) = responder.cache().record(&widget) {
        warn!(widget_id = id, error = %err, "failed to record widget fingerprint");
    }

    responder.expose(&widget, ExposeOptions::default())
}

pub async fn delete_widget(
    State(state): State<ApiState>,
    responder: Responder,
    path: Result<Path<(String, u64)>, PathRejection>,
) -> Response {
    let id = match widget_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(widget) = state.widgets.remove(id) else {
        return widget_not_found(id);
    };

    if let Err(err) = responder.cache().remove(&widget) {
        warn!(widget_id = id, error = %err, "failed to remove widget fingerprint");
    }

    responder.no_content(StatusCode::NO_CONTENT)
}

fn widget_id(path: Result<Path<(String, u64)>, PathRejection>) -> Result<u64, Response> {
    path.map(|Path((_, id))| id)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()).into_response())
}

fn widget_name(payload: Result<Json<WidgetRequest>, JsonRejection>) -> Result<String, Response> {
    let Json(payload) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()).into_response())?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty").into_response());
    }
    Ok(name.to_string())
}

fn widget_not_found(id: u64) -> Response {
    ApiError::not_found(format!("widget {id} does not exist")).into_response()
}
