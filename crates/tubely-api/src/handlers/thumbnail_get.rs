use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;
use tubely_core::models::MediaReference;
use tubely_core::AppError;
use uuid::Uuid;

/// Serve a thumbnail stored inline on the video record.
#[utoipa::path(
    get,
    path = "/api/thumbnails/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes with the stored content type"),
        (status = 404, description = "Video or inline thumbnail not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id))]
pub async fn get_thumbnail(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .db
        .videos
        .get_video(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    match video.thumbnail {
        Some(MediaReference::Inline { data, media_type }) => {
            Ok(([(header::CONTENT_TYPE, media_type)], data))
        }
        _ => Err(AppError::NotFound(format!("Thumbnail for video {} not found", id)).into()),
    }
}
