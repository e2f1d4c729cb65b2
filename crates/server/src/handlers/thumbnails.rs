//! Thumbnail handler.

use super::common::{document, find_image, origin, select};
use crate::error::{ApiError, ApiResult};
use crate::negotiate::{Representation, THUMBNAIL};
use crate::state::AppState;
use crate::templates::names;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use imgapi_storage::DeriveError;
use tracing::instrument;

/// GET /images/{digest}/thumbnail
///
/// Derives the thumbnail, then serves it as PNG or as a link document.
#[instrument(skip(state, headers))]
pub async fn get_thumbnail(
    State(state): State<AppState>,
    Path(digest): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    serve_thumbnail(&state, &digest, &headers)
        .await
        .inspect_err(ApiError::log)
}

async fn serve_thumbnail(
    state: &AppState,
    digest: &str,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let image = find_image(state, digest).await?;
    let height = state.config.thumbnail.height;
    let path = state.deriver.derive(&image, height).await?;

    let offer = select(headers, THUMBNAIL)?;
    let body = match offer.representation {
        Representation::Binary => {
            let data = tokio::fs::read(&path).await.map_err(DeriveError::from)?;
            Bytes::from(data)
        }
        Representation::N3 | Representation::JsonLd => {
            let base = origin(state, headers);
            let image_url = format!("{base}{}", state.paths.item(&image.digest));
            let thumbnail_url = format!("{base}{}", state.paths.thumbnail(&image.digest));
            let height = height.to_string();
            let template = if offer.representation == Representation::N3 {
                names::THUMBNAIL_N3
            } else {
                names::THUMBNAIL_JSONLD
            };
            state
                .templates
                .render(
                    template,
                    &[
                        ("image_url", image_url.as_str()),
                        ("thumbnail_url", thumbnail_url.as_str()),
                        ("height", height.as_str()),
                    ],
                )?
        }
    };

    Ok(document(StatusCode::OK, offer.media_type, body))
}
