use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use vidscribe::VidscribeError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Job ID is required")]
    MissingJobId,

    #[error("Job not found")]
    JobNotFound,

    /// The blocking database task died before answering.
    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        #[source]
        source: VidscribeError,
    },
}

impl ApiError {
    /// Validation failures are the client's fault, everything else is ours.
    pub fn from_service(message: &'static str, err: VidscribeError) -> Self {
        match err {
            VidscribeError::Validation(e) => ApiError::Validation(e.to_string()),
            source => ApiError::Internal { message, source },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response(),
            ApiError::Multipart(e) => (
                e.status(),
                Json(json!({ "success": false, "message": e.body_text() })),
            )
                .into_response(),
            ApiError::MissingJobId | ApiError::JobNotFound => {
                let status = if matches!(self, ApiError::MissingJobId) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::NOT_FOUND
                };
                (status, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApiError::Task(e) => {
                tracing::error!(error = %e, "Database task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "message": "Database task failed" })),
                )
                    .into_response()
            }
            ApiError::Internal { message, source } => {
                tracing::error!(error = %source, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": message,
                        "error": source.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}
