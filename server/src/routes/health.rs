use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "uptimeSeconds": state.uptime_seconds(),
    }))
}

/// GET /api/db-status
pub async fn db_status(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = Utc::now().to_rfc3339();
    let service = state.service.clone();
    let counts = tokio::task::spawn_blocking(move || service.counts())
        .await
        .map_err(|e| e.to_string())
        .and_then(|counts| counts.map_err(|e| e.to_string()));
    match counts {
        Ok(jobs) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "connected",
                "jobs": jobs,
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Database status check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "database": "disconnected",
                    "error": e,
                    "timestamp": timestamp,
                })),
            )
        }
    }
}
