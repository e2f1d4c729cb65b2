//! Route configuration.

use crate::error::ApiError;
use crate::handlers::{self, ALLOW_COLLECTION, ALLOW_ITEM, ALLOW_ROOT, ALLOW_THUMBNAIL};
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, options};
use std::future::{Ready, ready};
use tower_http::trace::TraceLayer;

/// Handler answering 405 with the verbs a path supports.
fn method_not_allowed(
    allow: &'static str,
) -> impl FnOnce() -> Ready<ApiError> + Clone + Send + Sync + 'static {
    move || {
        let err = ApiError::MethodNotAllowed { allow };
        err.log();
        ready(err)
    }
}

/// Create the application router.
///
/// Paths follow the configured language, e.g. `/images/{digest}/thumbnail`
/// or `/bilder/{digest}/miniaturbild`.
pub fn create_router(state: AppState) -> Router {
    let paths = state.paths.clone();
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        // API root: combined description of every operation
        .route(
            "/",
            get(handlers::browse_api)
                .options(handlers::describe_api)
                .fallback(method_not_allowed(ALLOW_ROOT)),
        )
        .route(
            &paths.collection(),
            get(handlers::browse_collection)
                .post(handlers::add_image)
                .options(handlers::describe_collection)
                .fallback(method_not_allowed(ALLOW_COLLECTION)),
        )
        .route(
            &paths.item_route(),
            get(handlers::get_image)
                .options(handlers::describe_image)
                .fallback(method_not_allowed(ALLOW_ITEM)),
        )
        .route(
            &paths.thumbnail_route(),
            options(handlers::describe_thumbnail)
                .get(handlers::get_thumbnail)
                .fallback(method_not_allowed(ALLOW_THUMBNAIL)),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
