//! Tubely media processing
//!
//! Everything the upload pipeline does to a file between receiving it and
//! handing it to storage:
//!
//! - [`classifier`]: content type and aspect ratio classification
//! - [`staging`]: scoped scratch files for request bodies
//! - [`cleanup`]: reverse-order cleanup actions tied to a scope
//! - [`toolchain`]: the ffmpeg/ffprobe boundary behind [`MediaToolchain`]
//! - [`faststart`]: container rewrite for progressive playback

pub mod classifier;
pub mod cleanup;
pub mod error;
pub mod faststart;
pub mod staging;
pub mod toolchain;

pub use classifier::{classify_aspect_ratio, classify_media_type, probe_orientation, MediaKind};
pub use cleanup::CleanupStack;
pub use error::{ProcessingError, ProcessingResult};
pub use faststart::{faststart_output_path, FastStartRewriter};
pub use staging::{StagingArea, StagingFile};
pub use toolchain::{FfmpegToolchain, MediaToolchain};
