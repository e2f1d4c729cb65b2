//! Failure logs carry the digest of the image being served.

mod common;

use axum::http::StatusCode;
use common::{TestServer, test_png};
use imgapi_core::ImageDigest;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Shared in-memory log sink.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    fn lines_with(&self, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

fn capture_logs() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    (capture, tracing::subscriber::set_default(subscriber))
}

#[tokio::test]
async fn test_derivation_failure_logged_with_digest() {
    let (logs, _guard) = capture_logs();
    let server = TestServer::new().await;
    let data = b"not an image at all";
    let digest = ImageDigest::compute(data);
    server.upload("broken.png", data).await;

    let response = server
        .get(&format!("/images/{digest}/thumbnail"), Some("image/png"))
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    let failures = logs.lines_with("Request failed");
    assert_eq!(failures.len(), 1, "logs: {failures:?}");
    assert!(failures[0].contains(&digest.to_hex()), "log: {}", failures[0]);
}

#[tokio::test]
async fn test_rejection_logged_with_digest() {
    let (logs, _guard) = capture_logs();
    let server = TestServer::new().await;
    let original = test_png(6, 6);
    let digest = ImageDigest::compute(&original);
    server.upload("a.png", &original).await;

    let response = server
        .get(&format!("/images/{digest}"), Some("text/html"))
        .await;
    assert_eq!(response.status, StatusCode::NOT_ACCEPTABLE);

    let rejections = logs.lines_with("Request rejected");
    assert_eq!(rejections.len(), 1, "logs: {rejections:?}");
    assert!(rejections[0].contains(&digest.to_hex()), "log: {}", rejections[0]);
}
