//! Media types served by the API.

/// RESTdesc hypermedia descriptions.
pub const TEXT_N3: &str = "text/n3";

/// Structured link documents.
pub const JSON_LD: &str = "application/ld+json";

/// RFC 7807 problem details.
pub const PROBLEM_JSON: &str = "application/problem+json";

/// Thumbnails are always encoded as PNG.
pub const IMAGE_PNG: &str = "image/png";

/// Fallback for originals whose format cannot be recognized.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Sniff the media type of image bytes from their magic number.
///
/// Returns [`OCTET_STREAM`] when the format is not recognized.
pub fn sniff_image_type(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .map(|format| format.to_mime_type())
        .unwrap_or(OCTET_STREAM)
}
