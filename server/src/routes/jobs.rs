use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use vidscribe::{JobId, VideoUpload};

use crate::error::ApiError;
use crate::state::AppState;

pub const UPLOAD_FIELD: &str = "video";

/// POST /api/process-video
///
/// Takes the multipart field `video`; other fields are ignored.
pub async fn process_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some(VideoUpload::new(filename, content_type, bytes.to_vec()));
        break;
    }

    let receipt = state
        .service
        .submit(upload)
        .await
        .map_err(|e| ApiError::from_service("Failed to start video processing", e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "message": "Video submitted for processing",
            "jobId": receipt.job_id,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct JobStatusQuery {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

/// GET /api/job-status?jobId=...
pub async fn job_status(
    State(state): State<AppState>,
    Query(query): Query<JobStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = query
        .job_id
        .filter(|id| !id.trim().is_empty())
        .map(JobId::from)
        .ok_or(ApiError::MissingJobId)?;

    let service = state.service.clone();
    let job = tokio::task::spawn_blocking(move || service.poll(&job_id))
        .await?
        .map_err(|e| ApiError::from_service("Failed to read job status", e))?
        .ok_or(ApiError::JobNotFound)?;

    Ok(Json(job))
}
