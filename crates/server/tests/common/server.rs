//! Server test utilities.

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use bytes::Bytes;
use imgapi_core::config::AppConfig;
use imgapi_server::{AppState, build_state, create_router};
use tempfile::TempDir;
use tower::ServiceExt;

use super::fixtures::{MULTIPART_CONTENT_TYPE, multipart_body};

/// Collected response parts.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let mut config = AppConfig::for_testing(temp_dir.path().join("data"));
        modifier(&mut config);

        let state = build_state(config)
            .await
            .expect("Failed to build application state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Rebuild state and router from the same storage, as after a restart.
    pub async fn restart(&mut self) {
        let config = (*self.state.config).clone();
        self.state = build_state(config)
            .await
            .expect("Failed to rebuild application state");
        self.router = create_router(self.state.clone());
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a bodyless request with an optional Accept header.
    pub async fn request(&self, method: Method, uri: &str, accept: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(accept) = accept {
            builder = builder.header("Accept", accept);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get(&self, uri: &str, accept: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, accept).await
    }

    /// Upload `data` in multipart field `field`.
    pub async fn upload_field(
        &self,
        uri: &str,
        field: &str,
        file_name: &str,
        data: &[u8],
        accept: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("Content-Type", MULTIPART_CONTENT_TYPE);
        if let Some(accept) = accept {
            builder = builder.header("Accept", accept);
        }
        let body = multipart_body(field, file_name, data);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Upload `data` as an image to the English collection.
    pub async fn upload(&self, file_name: &str, data: &[u8]) -> TestResponse {
        self.upload_field("/images", "image", file_name, data, None)
            .await
    }
}
