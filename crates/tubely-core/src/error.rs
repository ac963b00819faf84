//! Error types module
//!
//! All failures of the upload pipeline and the read path are unified under
//! [`AppError`]. Each variant knows how it should be presented over HTTP via
//! the [`ErrorMetadata`] trait.
//!
//! The `From<sqlx::Error>` conversion is gated behind the `sqlx` feature.

use std::io;

use crate::models::ReferenceError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for client mistakes worth noticing (ownership, bad media)
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid identifier: {0}")]
    BadIdentifier(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Staging I/O error: {0}")]
    StagingIo(String),

    #[error("External tool not found: {tool}")]
    ExternalToolMissing { tool: String },

    #[error("External tool {tool} failed (exit code {exit_code:?}): {stderr}")]
    ExternalTool {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Malformed stored reference: {0}")]
    MalformedReference(String),

    #[error("Stored reference bucket {found:?} does not match configured bucket {expected:?}")]
    ReferenceMismatch { expected: String, found: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::BadIdentifier(err.to_string())
    }
}

impl From<ReferenceError> for AppError {
    fn from(err: ReferenceError) -> Self {
        AppError::MalformedReference(err.to_string())
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::BadIdentifier(_) => (
            400,
            "BAD_IDENTIFIER",
            false,
            Some("Use the UUID of an existing video"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthenticated(_) => (
            401,
            "UNAUTHENTICATED",
            false,
            Some("Send a valid bearer token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Only the owner of a video can change its media"),
            false,
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedMediaType(_) => (
            406,
            "UNSUPPORTED_MEDIA_TYPE",
            false,
            Some("Upload a file with a matching image/* or video/* content type"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::StagingIo(_) => (
            500,
            "STAGING_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::ExternalToolMissing { .. } => (
            500,
            "MEDIA_TOOL_MISSING",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
        AppError::ExternalTool { .. } => (
            500,
            "MEDIA_PROCESSING_ERROR",
            false,
            Some("Check the video file and try a different one"),
            true,
            LogLevel::Error,
        ),
        AppError::Upload(_) => (
            500,
            "UPLOAD_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Persistence(_) => (
            500,
            "PERSISTENCE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::MalformedReference(_) => (
            500,
            "MALFORMED_REFERENCE",
            false,
            Some("Re-upload the media for this video"),
            true,
            LogLevel::Error,
        ),
        AppError::ReferenceMismatch { .. } => (
            500,
            "REFERENCE_MISMATCH",
            false,
            Some("Re-upload the media for this video"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::BadIdentifier(_) => "BadIdentifier",
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::StagingIo(_) => "StagingIOError",
            AppError::ExternalToolMissing { .. } => "ExternalToolMissing",
            AppError::ExternalTool { .. } => "ExternalToolError",
            AppError::Upload(_) => "UploadError",
            AppError::Persistence(_) => "PersistenceError",
            AppError::MalformedReference(_) => "MalformedReference",
            AppError::ReferenceMismatch { .. } => "ReferenceMismatch",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::BadIdentifier(_) => "Invalid video ID".to_string(),
            AppError::Unauthenticated(ref msg) => msg.clone(),
            AppError::Forbidden(_) => "You do not own this video".to_string(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::UnsupportedMediaType(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::StagingIo(_)
            | AppError::ExternalToolMissing { .. }
            | AppError::ExternalTool { .. }
            | AppError::Upload(_)
            | AppError::Persistence(_)
            | AppError::MalformedReference(_)
            | AppError::ReferenceMismatch { .. }
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
