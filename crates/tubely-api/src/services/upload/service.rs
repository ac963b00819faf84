//! Upload orchestrator

use std::sync::Arc;

use axum::extract::Multipart;
use axum::http::HeaderMap;
use chrono::Utc;
use tubely_core::models::{MediaReference, RemoteObject, VideoRecord};
use tubely_core::{AppError, ThumbnailPlacement};
use tubely_processing::{probe_orientation, CleanupStack, FastStartRewriter, MediaKind};
use tubely_storage::{derive_video_key, remote_thumbnail_key, thumbnail_key, Storage};
use uuid::Uuid;

use super::form::stage_form_file;
use super::types::{StagedUpload, UploadProgress, UploadStage};
use crate::auth::AuthUser;
use crate::constants::{THUMBNAIL_FIELD, VIDEO_FIELD};
use crate::error::storage_error;
use crate::state::AppState;

/// Runs the thumbnail and video upload pipelines for one request.
pub struct UploadOrchestrator {
    state: Arc<AppState>,
}

impl UploadOrchestrator {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Replace the thumbnail of `raw_video_id` with the form's `thumbnail` file.
    pub async fn upload_thumbnail(
        &self,
        raw_video_id: &str,
        headers: &HeaderMap,
        mut multipart: Multipart,
    ) -> Result<VideoRecord, AppError> {
        let mut progress = UploadProgress::new("thumbnail");
        let result = self
            .run_thumbnail(&mut progress, raw_video_id, headers, &mut multipart)
            .await;
        progress.finish(&result);
        result
    }

    /// Replace the video of `raw_video_id` with the form's `video` file.
    pub async fn upload_video(
        &self,
        raw_video_id: &str,
        headers: &HeaderMap,
        mut multipart: Multipart,
    ) -> Result<VideoRecord, AppError> {
        let mut progress = UploadProgress::new("video");
        let result = self
            .run_video(&mut progress, raw_video_id, headers, &mut multipart)
            .await;
        progress.finish(&result);
        result
    }

    /// Resolve the caller and the target record, and check ownership.
    ///
    /// Fails with `BadIdentifier`, `Unauthenticated`, `NotFound` or
    /// `Forbidden`, in that order of precedence.
    pub async fn authorize(
        &self,
        raw_video_id: &str,
        headers: &HeaderMap,
    ) -> Result<VideoRecord, AppError> {
        let video_id = Uuid::parse_str(raw_video_id).map_err(|_| {
            AppError::BadIdentifier(format!("{:?} is not a valid video ID", raw_video_id))
        })?;

        let caller = AuthUser::authenticate(&self.state, headers).await?;

        let video = self
            .state
            .db
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        if !video.is_owned_by(caller.user_id) {
            tracing::warn!(
                video_id = %video_id,
                user_id = %caller.user_id,
                owner_id = %video.user_id,
                "Upload attempted by a user who does not own the video"
            );
            return Err(AppError::Forbidden(format!(
                "User {} does not own video {}",
                caller.user_id, video_id
            )));
        }

        Ok(video)
    }

    async fn run_thumbnail(
        &self,
        progress: &mut UploadProgress,
        raw_video_id: &str,
        headers: &HeaderMap,
        multipart: &mut Multipart,
    ) -> Result<VideoRecord, AppError> {
        let media = &self.state.media;

        let video = self.authorize(raw_video_id, headers).await?;
        progress.set_video(video.id);

        progress.enter(UploadStage::Staging);
        let staged = stage_form_file(
            multipart,
            THUMBNAIL_FIELD,
            MediaKind::Image,
            media.limits.max_thumbnail_bytes,
            &media.staging,
        )
        .await?;

        progress.enter(UploadStage::Naming);
        let reference = match media.thumbnail_placement {
            ThumbnailPlacement::Local => {
                let key = thumbnail_key(video.id, &staged.extension);
                progress.enter(UploadStage::Uploading);
                media
                    .assets
                    .upload_file(&key, staged.file.path(), &staged.content_type)
                    .await
                    .map_err(storage_error)?;
                MediaReference::LocalFile {
                    url: media.assets.public_url(&key),
                }
            }
            ThumbnailPlacement::Remote => {
                let key = remote_thumbnail_key(video.id, &staged.extension);
                progress.enter(UploadStage::Uploading);
                self.put_object(&key, &staged).await?
            }
            ThumbnailPlacement::Inline => {
                progress.enter(UploadStage::Uploading);
                MediaReference::Inline {
                    data: staged.file.read_all().await?.to_vec(),
                    media_type: staged.content_type.clone(),
                }
            }
        };

        progress.enter(UploadStage::PersistingRecord);
        self.persist(video.id, StoredField::Thumbnail, reference)
            .await
    }

    async fn run_video(
        &self,
        progress: &mut UploadProgress,
        raw_video_id: &str,
        headers: &HeaderMap,
        multipart: &mut Multipart,
    ) -> Result<VideoRecord, AppError> {
        let media = &self.state.media;

        let video = self.authorize(raw_video_id, headers).await?;
        progress.set_video(video.id);

        progress.enter(UploadStage::Staging);
        let staged = stage_form_file(
            multipart,
            VIDEO_FIELD,
            MediaKind::Video,
            media.limits.max_video_bytes,
            &media.staging,
        )
        .await?;

        // Declared after `staged`, so intermediates go before the staged file.
        let mut cleanup = CleanupStack::new();

        progress.enter(UploadStage::FastStart);
        let rewriter = FastStartRewriter::new(Arc::clone(&media.toolchain));
        let faststart = rewriter
            .rewrite_for_progressive_playback(staged.file.path(), &mut cleanup)
            .await?;

        progress.enter(UploadStage::Probing);
        let orientation = probe_orientation(media.toolchain.as_ref(), &faststart).await?;

        progress.enter(UploadStage::Naming);
        let key = derive_video_key(orientation, &staged.extension);

        progress.enter(UploadStage::Uploading);
        let start = std::time::Instant::now();
        let size = media
            .storage
            .upload_file(&key, &faststart, &staged.content_type)
            .await
            .map_err(storage_error)?;
        tracing::info!(
            video_id = %video.id,
            bucket = %media.storage.bucket(),
            key = %key,
            orientation = %orientation,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Uploaded video to object store"
        );

        progress.enter(UploadStage::PersistingRecord);
        let reference =
            MediaReference::RemoteObject(RemoteObject::new(media.storage.bucket(), key));
        let video = self
            .persist(video.id, StoredField::Video, reference)
            .await?;

        cleanup.run();
        Ok(video)
    }

    async fn put_object(
        &self,
        key: &str,
        staged: &StagedUpload,
    ) -> Result<MediaReference, AppError> {
        let storage = &self.state.media.storage;
        let size = storage
            .upload_file(key, staged.file.path(), &staged.content_type)
            .await
            .map_err(storage_error)?;

        tracing::info!(
            bucket = %storage.bucket(),
            key = %key,
            size_bytes = size,
            "Uploaded object"
        );

        Ok(MediaReference::RemoteObject(RemoteObject::new(
            storage.bucket(),
            key,
        )))
    }

    /// Write one reference back to the record. Only that field and
    /// `updated_at` change, so a concurrent upload of the other field
    /// survives. A failure here leaves `reference` orphaned in storage; it
    /// is logged and not rolled back.
    async fn persist(
        &self,
        video_id: Uuid,
        field: StoredField,
        reference: MediaReference,
    ) -> Result<VideoRecord, AppError> {
        let videos = &self.state.db.videos;
        let updated_at = Utc::now();

        let result = match field {
            StoredField::Video => {
                videos
                    .set_video_reference(video_id, &reference, updated_at)
                    .await
            }
            StoredField::Thumbnail => {
                videos
                    .set_thumbnail(video_id, &reference, updated_at)
                    .await
            }
        };

        result.map_err(|e| {
            tracing::warn!(
                video_id = %video_id,
                field = ?field,
                orphaned_reference = ?reference.to_wire(),
                error = %e,
                "Record update failed after upload; stored object is orphaned"
            );
            e
        })
    }
}

/// Which reference an upload replaces.
#[derive(Debug, Clone, Copy)]
enum StoredField {
    Video,
    Thumbnail,
}
