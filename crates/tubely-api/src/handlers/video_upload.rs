use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadOrchestrator;
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tubely_core::models::VideoResponse;

/// Upload a video file for an existing record.
///
/// The file is rewritten for fast start, classified by aspect ratio and
/// stored under a fresh random key. The response carries the stored
/// `bucket,key` reference; use `GET /api/videos/{video_id}` for a playable URL.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "uploads",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form with a `video` file"),
    responses(
        (status = 200, description = "Video stored", body = VideoResponse),
        (status = 400, description = "Invalid video ID, form or video stream", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 406, description = "Not a video", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers, multipart))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = UploadOrchestrator::new(&state)
        .upload_video(&video_id, &headers, multipart)
        .await?;

    Ok(Json(VideoResponse::from(&video)))
}
