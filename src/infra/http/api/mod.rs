//! Demo API exercising the envelope, caching and JSONP pipeline.

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::application::controller::{ControllerConfig, JsonpOptions};

use super::Controller;

/// Routes for the demo controllers, each inheriting from `root`.
pub fn build_api_router(state: &ApiState, root: &ControllerConfig) -> Router<ApiState> {
    let engine = state.cache.clone();

    let echo = Controller::new(root.child().jsonp(JsonpOptions::default()), engine.clone())
        .action("/{version}/echo", "echo", get(handlers::echo));

    let widgets = Controller::new(root.child().caches(["index", "show"], None), engine)
        .action("/{version}/widgets", "index", get(handlers::list_widgets))
        .action(
            "/{version}/widgets",
            "create",
            post(handlers::create_widget),
        )
        .action(
            "/{version}/widgets/paged",
            "paged",
            get(handlers::paged_widgets),
        )
        .action("/{version}/widgets/{id}", "show", get(handlers::show_widget))
        .action(
            "/{version}/widgets/{id}",
            "update",
            put(handlers::update_widget),
        )
        .action(
            "/{version}/widgets/{id}",
            "destroy",
            delete(handlers::delete_widget),
        );

    Router::new()
        .merge(echo.into_router())
        .merge(widgets.into_router())
}
