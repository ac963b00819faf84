//! Upload pipeline
//!
//! `Authorizing → Staging → (video: FastStart → Probing) → Naming →
//! Uploading → PersistingRecord → Done`, or `Aborted` from any stage.
//! Every local file the pipeline creates is owned by a guard that removes
//! it when the request ends.

mod form;
mod service;
mod types;

pub use form::stage_form_file;
pub use service::UploadOrchestrator;
pub use types::{StagedUpload, UploadStage};
