//! API error types.
//!
//! Every failure leaves a handler as an RFC 7807 problem document whose
//! `status` field mirrors the status line.

use crate::templates::TemplateError;
use axum::Json;
use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use imgapi_core::media::PROBLEM_JSON;
use imgapi_storage::{DeriveError, StorageError};
use serde::Serialize;

/// Problem details document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            problem_type: None,
            title: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
        }
    }

    /// Set the URI reference identifying this occurrence.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self)).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        response
    }
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed, supported methods: {allow}")]
    MethodNotAllowed { allow: &'static str },

    #[error("no representation matches Accept: {requested} (available: {available})")]
    NotAcceptable { requested: String, available: String },

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("derivation error: {0}")]
    Derive(#[from] DeriveError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(e) => match e {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Derive(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable detail for the problem document.
    ///
    /// Server errors get a fixed message; the cause is only logged.
    fn detail(&self) -> String {
        match self {
            Self::NotFound(_) | Self::Storage(StorageError::NotFound(_)) => {
                "The requested resource was not found on this server".to_string()
            }
            Self::NotImplemented(_) => "The request was understood, but the underlying \
                                        implementation is not available yet."
                .to_string(),
            Self::BadRequest(msg) | Self::PayloadTooLarge(msg) => msg.clone(),
            Self::MethodNotAllowed { allow } => {
                format!("The method is not supported by this resource; use one of: {allow}")
            }
            Self::NotAcceptable { available, .. } => {
                format!("No acceptable representation is available; this resource offers: {available}")
            }
            Self::Internal(_) | Self::Storage(_) | Self::Derive(_) | Self::Template(_) => {
                "The server failed to process the request".to_string()
            }
        }
    }

    /// Log the failure in the current span.
    ///
    /// Handlers call this before returning so the event carries their span
    /// fields, e.g. the digest being served.
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "Request rejected");
        }
    }

    /// Convert into a problem document.
    pub fn to_problem(&self) -> ProblemDetails {
        ProblemDetails::new(self.status_code(), self.detail())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.to_problem().into_response();
        if let Self::MethodNotAllowed { allow } = self {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(allow));
        }
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Storage(StorageError::NotFound("d".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Storage(StorageError::Unavailable("gone".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Derive(DeriveError::Failed("corrupt".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_problem_mirrors_status() {
        let problem = ApiError::NotFound("abc".into()).to_problem();
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["status"], 404);
        assert!(json.get("type").is_none());
        assert!(json.get("instance").is_none());
    }

    #[test]
    fn test_server_error_detail_is_generic() {
        let problem = ApiError::Storage(StorageError::Unavailable("/srv/data".into())).to_problem();
        assert_eq!(problem.status, 500);
        assert!(!problem.detail.contains("/srv/data"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = ApiError::MethodNotAllowed {
            allow: "GET, OPTIONS",
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, OPTIONS");
        assert_eq!(response.headers()[CONTENT_TYPE], PROBLEM_JSON);
    }
}
