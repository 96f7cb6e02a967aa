use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;
use tracing::{error, warn};

#[derive(Debug, ThisError)]
pub enum CinkbertError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Expected between {min} and {max} training images, got {actual}")]
    InvalidImageCount {
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Payload too large: {actual} bytes exceeds {limit} bytes")]
    PayloadTooLarge { actual: usize, limit: usize },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("{provider} returned status {status}")]
    UpstreamStatus {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} returned an unusable payload: {reason}")]
    UpstreamPayload {
        provider: &'static str,
        reason: String,
    },

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Upstream job {request_id} failed: {reason}")]
    JobFailed { request_id: String, reason: String },

    #[error("Upstream job {request_id} did not finish within {timeout_secs}s")]
    JobTimeout {
        request_id: String,
        timeout_secs: u64,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl CinkbertError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        CinkbertError::InvalidRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CinkbertError::InvalidRequest(_) | CinkbertError::InvalidImageCount { .. } => {
                StatusCode::BAD_REQUEST
            }
            CinkbertError::Multipart(err) => err.status(),
            CinkbertError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            CinkbertError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CinkbertError::InvalidCredentials | CinkbertError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            CinkbertError::UpstreamStatus { status, .. }
                if *status == StatusCode::TOO_MANY_REQUESTS =>
            {
                StatusCode::TOO_MANY_REQUESTS
            }
            CinkbertError::UpstreamStatus { .. }
            | CinkbertError::UpstreamPayload { .. }
            | CinkbertError::ReqwestError(_)
            | CinkbertError::JsonError(_)
            | CinkbertError::UrlError(_)
            | CinkbertError::JobFailed { .. } => StatusCode::BAD_GATEWAY,
            CinkbertError::JobTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CinkbertError::DatabaseError(_)
            | CinkbertError::RactorError(_)
            | CinkbertError::IoError(_)
            | CinkbertError::ZipError(_)
            | CinkbertError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_api_error(&self) -> ApiErrorObject {
        let (code, message, details) = match self {
            CinkbertError::InvalidRequest(reason) => {
                ("INVALID_REQUEST", reason.clone(), None)
            }
            CinkbertError::InvalidImageCount { actual, min, max } => (
                "INVALID_IMAGE_COUNT",
                format!("Upload between {min} and {max} images; received {actual}."),
                Some(json!({ "actual": actual, "min": min, "max": max })),
            ),
            CinkbertError::Multipart(err) => ("INVALID_MULTIPART", err.body_text(), None),
            CinkbertError::ModelNotFound(id) => (
                "MODEL_NOT_FOUND",
                format!("Model '{id}' does not exist."),
                Some(json!({ "model": id })),
            ),
            CinkbertError::PayloadTooLarge { actual, limit } => (
                "PAYLOAD_TOO_LARGE",
                format!("Upload is too large; the limit is {} MB.", limit / (1024 * 1024)),
                Some(json!({ "actual": actual, "limit": limit })),
            ),
            CinkbertError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid email or password.".to_string(),
                None,
            ),
            CinkbertError::Unauthorized(reason) => ("UNAUTHORIZED", reason.to_string(), None),
            CinkbertError::UpstreamStatus {
                provider, status, ..
            } if *status == StatusCode::TOO_MANY_REQUESTS => (
                "RATE_LIMIT",
                "Upstream rate limit exceeded.".to_string(),
                Some(json!({ "provider": provider })),
            ),
            CinkbertError::UpstreamStatus {
                provider, status, ..
            } => (
                "UPSTREAM_ERROR",
                format!("External service {provider} failed."),
                Some(json!({ "provider": provider, "status": status.as_u16() })),
            ),
            CinkbertError::JsonError(_) => (
                "BAD_UPSTREAM_PAYLOAD",
                "Failed to parse upstream response.".to_string(),
                None,
            ),
            CinkbertError::UpstreamPayload { provider, .. } => (
                "BAD_UPSTREAM_PAYLOAD",
                format!("External service {provider} returned an unexpected response."),
                Some(json!({ "provider": provider })),
            ),
            CinkbertError::ReqwestError(_) | CinkbertError::UrlError(_) => (
                "UPSTREAM_ERROR",
                "Upstream service error.".to_string(),
                None,
            ),
            CinkbertError::JobFailed { request_id, reason } => (
                "JOB_FAILED",
                format!("The job failed: {reason}"),
                Some(json!({ "request_id": request_id })),
            ),
            CinkbertError::JobTimeout {
                request_id,
                timeout_secs,
            } => (
                "JOB_TIMEOUT",
                format!("The job did not finish within {timeout_secs} seconds."),
                Some(json!({ "request_id": request_id })),
            ),
            CinkbertError::DatabaseError(_)
            | CinkbertError::RactorError(_)
            | CinkbertError::IoError(_)
            | CinkbertError::ZipError(_)
            | CinkbertError::UnexpectedError(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred.".to_string(),
                None,
            ),
        };
        ApiErrorObject {
            code: code.to_string(),
            message,
            details,
        }
    }
}

impl From<JsonRejection> for CinkbertError {
    fn from(rejection: JsonRejection) -> Self {
        CinkbertError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for CinkbertError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = ApiErrorBody {
            inner: self.to_api_error(),
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Debug, Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
