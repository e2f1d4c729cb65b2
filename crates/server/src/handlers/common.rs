//! Shared handler helpers.

use crate::error::{ApiError, ApiResult, ProblemDetails};
use crate::negotiate::{self, Offer};
use crate::state::AppState;
use axum::body::Body;
use axum::http::header::{ACCEPT, CONTENT_TYPE, HOST};
use axum::http::uri::Authority;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use imgapi_core::{Image, ImageDigest};

/// Combined Accept header value, if any.
pub fn accept_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Select the representation to serve from `offers`.
pub fn select(headers: &HeaderMap, offers: &[Offer]) -> ApiResult<Offer> {
    let accept = accept_header(headers);
    negotiate::negotiate(accept.as_deref(), offers).ok_or_else(|| ApiError::NotAcceptable {
        requested: accept.unwrap_or_default(),
        available: negotiate::media_types(offers),
    })
}

/// Absolute origin (`scheme://authority`) for links in responses.
///
/// Resolution order:
/// 1. `server.public_base_url` from configuration
/// 2. The request's `Host` header, if it is a valid authority
/// 3. The configured bind address
pub fn origin(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.server.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Authority>().ok());
    match host {
        Some(authority) => format!("http://{authority}"),
        None => match state.config.server.bind_addr() {
            Ok(addr) => format!("http://{addr}"),
            Err(_) => format!("http://{}", state.config.server.bind),
        },
    }
}

/// Parse a digest from a path segment.
///
/// A malformed digest cannot name a stored image, so it is reported as not found.
pub fn parse_digest(raw: &str) -> ApiResult<ImageDigest> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("malformed digest: {raw}")))
}

/// Look up an image in the index.
pub async fn find_image(state: &AppState, raw: &str) -> ApiResult<Image> {
    let digest = parse_digest(raw)?;
    state
        .index
        .lookup(&digest)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("image {digest}")))
}

/// Response carrying `body` as `media_type`.
pub fn document(status: StatusCode, media_type: &'static str, body: Bytes) -> Response {
    (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static(media_type))],
        Body::from(body),
    )
        .into_response()
}

/// Fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> Response {
    tracing::info!(path = %uri.path(), "No route for request");
    ProblemDetails::new(
        StatusCode::NOT_FOUND,
        "The requested resource was not found on this server",
    )
    .with_instance(uri.path())
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_header_joins_values() {
        let mut headers = HeaderMap::new();
        assert_eq!(accept_header(&headers), None);

        headers.append(ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(ACCEPT, HeaderValue::from_static("text/n3;q=0.5"));
        assert_eq!(
            accept_header(&headers).as_deref(),
            Some("text/html, text/n3;q=0.5")
        );
    }

    #[test]
    fn test_parse_digest_malformed_is_not_found() {
        let err = parse_digest("not-a-digest").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let digest = ImageDigest::compute(b"x");
        assert_eq!(parse_digest(&digest.to_hex()).unwrap(), digest);
    }
}
