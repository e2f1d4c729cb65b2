//! Test fixtures.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "imgapi-test-boundary";

/// Content-Type header matching [`multipart_body`].
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data; boundary=imgapi-test-boundary";

/// Encode a PNG with a horizontal gradient so distinct sizes differ in content.
pub fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Build a multipart/form-data body with a single file field.
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
