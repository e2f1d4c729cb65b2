//! Image collection and item handlers.

use super::common::{document, find_image, origin, select};
use crate::error::{ApiError, ApiResult};
use crate::negotiate::{self, CREATED, Representation};
use crate::state::AppState;
use crate::templates::names;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use imgapi_core::media::sniff_image_type;
use imgapi_core::{Image, ImageDigest, UPLOAD_FIELD};
use tracing::instrument;

/// Uploaded file extracted from the multipart body.
struct Upload {
    file_name: Option<String>,
    data: Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Read the upload field, skipping any others.
async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload { file_name, data });
    }
    Err(ApiError::BadRequest(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}

/// Display name for an upload: the base name the client sent, else the digest.
fn display_name(file_name: Option<&str>, digest: &ImageDigest) -> String {
    file_name
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| digest.to_hex())
}

/// POST /images
#[instrument(skip_all, fields(digest = tracing::field::Empty))]
pub async fn add_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    store_upload(&state, &headers, multipart)
        .await
        .inspect_err(ApiError::log)
}

async fn store_upload(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    // Refuse before storing anything
    let offer = select(headers, CREATED)?;

    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    if upload.data.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "multipart field `{UPLOAD_FIELD}` is empty"
        )));
    }

    let outcome = state.store.put(upload.data).await?;
    tracing::Span::current().record("digest", tracing::field::display(&outcome.digest));
    let name = display_name(upload.file_name.as_deref(), &outcome.digest);
    state
        .index
        .insert(Image::new(outcome.digest, name.clone(), outcome.path))
        .await;

    tracing::info!(
        digest = %outcome.digest,
        name = %name,
        created = outcome.created,
        "Image added"
    );

    let base = origin(state, headers);
    let image_url = format!("{base}{}", state.paths.item(&outcome.digest));
    let thumbnail_url = format!("{base}{}", state.paths.thumbnail(&outcome.digest));
    let template = match offer.representation {
        Representation::JsonLd => names::CREATED_JSONLD,
        _ => names::CREATED_N3,
    };
    let body = state.templates.render(
        template,
        &[
            ("image_url", image_url.as_str()),
            ("thumbnail_url", thumbnail_url.as_str()),
            ("name", name.as_str()),
        ],
    )?;

    let mut response = document(StatusCode::CREATED, offer.media_type, body);
    let location = HeaderValue::from_str(&image_url)
        .map_err(|e| ApiError::Internal(format!("invalid location {image_url}: {e}")))?;
    response.headers_mut().insert(LOCATION, location);
    Ok(response)
}

/// GET /images/{digest}
#[instrument(skip(state, headers))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(digest): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_original(&state, &digest, &headers)
        .await
        .inspect_err(ApiError::log)
}

async fn serve_original(
    state: &AppState,
    digest: &str,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let image = find_image(state, digest).await?;
    let data = state.store.read_at(&image.path).await?;

    let offer = select(headers, &negotiate::original(sniff_image_type(&data)))?;
    Ok(document(StatusCode::OK, offer.media_type, data))
}
