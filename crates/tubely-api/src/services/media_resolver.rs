//! Read-side resolution of stored references into URLs a client can fetch.
//!
//! Remote objects get a freshly signed URL on every read. Nothing produced
//! here is written back to the record.

use tubely_core::models::{MediaReference, VideoRecord, VideoResponse};
use tubely_core::AppError;

use crate::error::storage_error;
use crate::state::MediaState;

pub struct MediaResolver<'a> {
    media: &'a MediaState,
}

impl<'a> MediaResolver<'a> {
    pub fn new(media: &'a MediaState) -> Self {
        Self { media }
    }

    /// Build the response for `video` with every reference resolved.
    pub async fn resolve(&self, video: &VideoRecord) -> Result<VideoResponse, AppError> {
        let mut response = VideoResponse::from(video);

        response.video_url = match &video.video {
            Some(reference) => Some(self.resolve_reference(video, reference).await?),
            None => None,
        };
        response.thumbnail_url = match &video.thumbnail {
            Some(reference) => Some(self.resolve_reference(video, reference).await?),
            None => None,
        };

        Ok(response)
    }

    pub async fn resolve_all(&self, videos: &[VideoRecord]) -> Result<Vec<VideoResponse>, AppError> {
        let mut responses = Vec::with_capacity(videos.len());
        for video in videos {
            responses.push(self.resolve(video).await?);
        }
        Ok(responses)
    }

    async fn resolve_reference(
        &self,
        video: &VideoRecord,
        reference: &MediaReference,
    ) -> Result<String, AppError> {
        match reference {
            MediaReference::LocalFile { url } => Ok(url.clone()),
            MediaReference::RemoteObject(object) => self
                .media
                .signer
                .issue_signed_url(object)
                .await
                .map_err(storage_error),
            MediaReference::Inline { .. } => Ok(video.inline_thumbnail_url()),
        }
    }
}
