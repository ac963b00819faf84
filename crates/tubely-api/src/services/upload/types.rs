use std::fmt;
use std::time::Instant;

use tubely_core::AppError;
use tubely_processing::StagingFile;
use uuid::Uuid;

/// Pipeline stage, recorded on every progress and abort log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Authorizing,
    Staging,
    FastStart,
    Probing,
    Naming,
    Uploading,
    PersistingRecord,
    Done,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Authorizing => "authorizing",
            UploadStage::Staging => "staging",
            UploadStage::FastStart => "fast_start",
            UploadStage::Probing => "probing",
            UploadStage::Naming => "naming",
            UploadStage::Uploading => "uploading",
            UploadStage::PersistingRecord => "persisting_record",
            UploadStage::Done => "done",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A form file that passed classification and sits on local disk.
#[derive(Debug)]
pub struct StagedUpload {
    /// Normalized `kind/subtype`, without parameters.
    pub content_type: String,
    pub extension: String,
    pub file: StagingFile,
}

/// Tracks the current stage of one upload for logging.
#[derive(Debug)]
pub(crate) struct UploadProgress {
    media: &'static str,
    stage: UploadStage,
    video_id: Option<Uuid>,
    started: Instant,
}

impl UploadProgress {
    pub(crate) fn new(media: &'static str) -> Self {
        Self {
            media,
            stage: UploadStage::Authorizing,
            video_id: None,
            started: Instant::now(),
        }
    }

    #[cfg(test)]
    pub(crate) fn stage(&self) -> UploadStage {
        self.stage
    }

    pub(crate) fn set_video(&mut self, video_id: Uuid) {
        self.video_id = Some(video_id);
    }

    pub(crate) fn enter(&mut self, stage: UploadStage) {
        self.stage = stage;
        tracing::debug!(
            media = self.media,
            video_id = ?self.video_id,
            stage = %stage,
            elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Upload stage"
        );
    }

    /// Log the outcome. On failure the stage that was running is reported.
    pub(crate) fn finish<T>(mut self, result: &Result<T, AppError>) {
        let duration_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(_) => {
                self.stage = UploadStage::Done;
                tracing::info!(
                    media = self.media,
                    video_id = ?self.video_id,
                    duration_ms = duration_ms,
                    "Upload complete"
                );
            }
            Err(e) => {
                tracing::warn!(
                    media = self.media,
                    video_id = ?self.video_id,
                    stage = %self.stage,
                    error_type = e.error_type(),
                    error = %e,
                    duration_ms = duration_ms,
                    "Upload aborted"
                );
            }
        }
    }
}
