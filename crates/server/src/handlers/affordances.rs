//! Hypermedia affordance descriptions.
//!
//! Each resource describes how to interact with it as a RESTdesc document.
//! OPTIONS responses also carry an `Allow` header listing the verbs the
//! router serves for that path.

use super::common::{document, origin, select};
use crate::error::{ApiError, ApiResult};
use crate::negotiate::{self, AFFORDANCE};
use crate::state::AppState;
use crate::templates::names;
use axum::extract::State;
use axum::http::header::ALLOW;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use imgapi_core::UPLOAD_FIELD;

/// Verbs served on `/`.
pub const ALLOW_ROOT: &str = "GET, HEAD, OPTIONS";
/// Verbs served on the image collection.
pub const ALLOW_COLLECTION: &str = "GET, HEAD, POST, OPTIONS";
/// Verbs served on a specific image.
pub const ALLOW_ITEM: &str = "GET, HEAD, OPTIONS";
/// Verbs served on a thumbnail.
pub const ALLOW_THUMBNAIL: &str = "GET, HEAD, OPTIONS";

/// Render the affordance `templates` as one document.
fn render_affordances(
    state: &AppState,
    headers: &HeaderMap,
    templates: &[&str],
) -> ApiResult<Bytes> {
    let collection_url = format!("{}{}", origin(state, headers), state.paths.collection());
    let created_accept = negotiate::media_types(negotiate::CREATED);
    let thumbnail_accept = negotiate::media_types(negotiate::THUMBNAIL);
    let height = state.config.thumbnail.height.to_string();
    let vars = [
        ("collection_url", collection_url.as_str()),
        ("field", UPLOAD_FIELD),
        ("created_accept", created_accept.as_str()),
        ("thumbnail_accept", thumbnail_accept.as_str()),
        ("thumbnail_name", state.paths.names().thumbnail),
        ("height", height.as_str()),
    ];

    Ok(state.templates.render_all(templates, &vars)?)
}

fn describe(
    state: &AppState,
    headers: &HeaderMap,
    templates: &[&str],
    allow: Option<&'static str>,
) -> ApiResult<Response> {
    render_description(state, headers, templates, allow).inspect_err(ApiError::log)
}

fn render_description(
    state: &AppState,
    headers: &HeaderMap,
    templates: &[&str],
    allow: Option<&'static str>,
) -> ApiResult<Response> {
    let offer = select(headers, AFFORDANCE)?;
    let body = render_affordances(state, headers, templates)?;

    let mut response = document(StatusCode::OK, offer.media_type, body);
    if let Some(allow) = allow {
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static(allow));
    }
    Ok(response)
}

const ALL_OPERATIONS: &[&str] = &[names::ADD_IMAGE, names::GET_IMAGE, names::GET_THUMBNAIL];

/// GET /
pub async fn browse_api(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    describe(&state, &headers, ALL_OPERATIONS, None)
}

/// OPTIONS /
pub async fn describe_api(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    describe(&state, &headers, ALL_OPERATIONS, Some(ALLOW_ROOT))
}

/// GET /images
pub async fn browse_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    describe(&state, &headers, &[names::ADD_IMAGE], None)
}

/// OPTIONS /images
pub async fn describe_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    describe(&state, &headers, &[names::ADD_IMAGE], Some(ALLOW_COLLECTION))
}

/// OPTIONS /images/{digest}
pub async fn describe_image(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    describe(&state, &headers, &[names::GET_IMAGE], Some(ALLOW_ITEM))
}

/// OPTIONS /images/{digest}/thumbnail
pub async fn describe_thumbnail(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    describe(&state, &headers, &[names::GET_THUMBNAIL], Some(ALLOW_THUMBNAIL))
}
