pub mod health;
pub mod jobs;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/process-video", post(jobs::process_video))
        .route("/api/job-status", get(jobs::job_status))
        .route("/api/health", get(health::health))
        .route("/api/db-status", get(health::db_status))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use vidscribe::pipeline::{ExtractionError, GenerationError, TranscriptionError};
    use vidscribe::storage::ArtifactStore;
    use vidscribe::{
        AudioExtractor, Capabilities, JobId, JobService, JobStore, TextGenerator, Transcriber,
        TransitionPolicy,
    };

    const BOUNDARY: &str = "vidscribe-test-boundary";

    struct FakeExtractor;

    #[async_trait]
    impl AudioExtractor for FakeExtractor {
        async fn extract(&self, video: &Path) -> Result<PathBuf, ExtractionError> {
            Ok(video.with_extension("mp3"))
        }
    }

    struct FakeTranscriber;

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio: &Path) -> Result<String, TranscriptionError> {
            Ok("hola".to_string())
        }
    }

    struct FakeGenerator;

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, _transcript: &str) -> Result<String, GenerationError> {
            Ok("informe".to_string())
        }
    }

    fn app(dir: &TempDir) -> (Router, JobService) {
        let service = JobService::new(
            JobStore::open_in_memory().unwrap(),
            TransitionPolicy::default(),
            ArtifactStore::new(dir.path().join("uploads"), dir.path().join("temp")),
            Capabilities::new(
                Arc::new(FakeExtractor),
                Arc::new(FakeTranscriber),
                Arc::new(FakeGenerator),
            ),
        );
        (
            router(AppState::new(service.clone()), 1024 * 1024),
            service,
        )
    }

    fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\n\
                 Content-Type: {c}\r\n\r\n",
                b = BOUNDARY,
                f = field,
                n = filename,
                c = content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/process-video")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_until_finished(service: &JobService, id: &JobId) {
        for _ in 0..200 {
            if let Some(job) = service.poll(id).unwrap() {
                if job.is_finished() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let response = app.oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["uptimeSeconds"].is_u64());
    }

    #[tokio::test]
    async fn test_job_status_requires_id() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let response = app.oneshot(get("/api/job-status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Job ID is required");
    }

    #[tokio::test]
    async fn test_job_status_unknown() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let response = app
            .oneshot(get("/api/job-status?jobId=job_nonexistent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_and_poll() {
        let dir = TempDir::new().unwrap();
        let (app, service) = app(&dir);

        let response = app
            .clone()
            .oneshot(multipart("video", "clase.mp4", "video/mp4", b"frames"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        let job_id = JobId::from(body["jobId"].as_str().unwrap());

        wait_until_finished(&service, &job_id).await;

        let response = app
            .oneshot(get(&format!("/api/job-status?jobId={}", job_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["progress"], 100);
        assert_eq!(body["result"]["generatedResponse"], "informe");
    }

    #[tokio::test]
    async fn test_submit_rejects_wrong_type() {
        let dir = TempDir::new().unwrap();
        let (app, service) = app(&dir);

        let response = app
            .oneshot(multipart("video", "foto.png", "image/png", b"png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
        assert_eq!(service.counts().unwrap().processing, 0);
    }

    #[tokio::test]
    async fn test_submit_without_video_field() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let response = app
            .oneshot(multipart("attachment", "clase.mp4", "video/mp4", b"frames"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Missing video file");
    }

    #[tokio::test]
    async fn test_db_status_counts() {
        let dir = TempDir::new().unwrap();
        let (app, service) = app(&dir);
        let id = service.store().create_job().unwrap();
        TransitionPolicy::default()
            .fail(service.store(), &id, "boom")
            .unwrap();
        service.store().create_job().unwrap();

        let response = app.oneshot(get("/api/db-status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["database"], "connected");
        assert_eq!(body["jobs"]["processing"], 1);
        assert_eq!(body["jobs"]["error"], 1);
        assert_eq!(body["jobs"]["completed"], 0);
    }
}
