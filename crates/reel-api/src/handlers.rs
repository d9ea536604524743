//! Request handlers.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use reel_models::{AssetListing, GenerateRequest, GenerateResponse, Session, Stage};

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub active_sessions: usize,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        active_sessions: state.pipeline.session_count(),
    })
}

/// Start a video generation session.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let session = state.pipeline.start(request.topic)?;
    Ok(Json(GenerateResponse::started(session.session_id)))
}

/// Poll session progress.
pub async fn status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Session>> {
    state
        .pipeline
        .status(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Session not found"))
}

/// List a session's on-disk artifacts.
pub async fn assets(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<AssetListing>> {
    state
        .pipeline
        .assets(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Session not found"))
}

/// Download the final video. Rejected until the session completes.
pub async fn download(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Response> {
    let session = state
        .pipeline
        .status(&session_id)
        .ok_or_else(|| ApiError::not_found("Session not found"))?;

    if session.stage != Stage::Completed {
        return Err(ApiError::bad_request("Video not ready yet"));
    }

    let path = session
        .video_path
        .ok_or_else(|| ApiError::internal("Completed session has no video path"))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found("Video file not found"))?;

    serve_bytes(bytes, "video/mp4", Some("final_video.mp4"))
}

/// Download an individual artifact file from a session directory.
pub async fn download_asset(
    State(state): State<AppState>,
    Path((session_id, filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let root = state
        .pipeline
        .session_dir(&session_id)
        .ok_or_else(|| ApiError::not_found("Session not found"))?;

    let path = root.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found("Asset not found"))?;

    serve_bytes(bytes, content_type_for(&filename), Some(&filename))
}

fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".mp3") {
        "audio/mpeg"
    } else if lower.ends_with(".mp4") {
        "video/mp4"
    } else if lower.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

fn serve_bytes(
    bytes: Vec<u8>,
    content_type: &'static str,
    attachment_name: Option<&str>,
) -> ApiResult<Response> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len());

    if let Some(name) = attachment_name {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        );
    }

    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("image_01.png"), "image/png");
        assert_eq!(content_type_for("voiceover.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("final_video.MP4"), "video/mp4");
        assert_eq!(
            content_type_for("script.txt"),
            "text/plain; charset=utf-8"
        );
        assert_eq!(content_type_for("mystery"), "application/octet-stream");
    }
}
