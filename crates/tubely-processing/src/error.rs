use tubely_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid media type: {0:?}")]
    InvalidMediaType(String),

    #[error("Expected a {expected} file, got {actual}")]
    WrongMediaKind { expected: String, actual: String },

    #[error("Probe report contains no streams")]
    NoStreamsFound,

    #[error("Malformed probe output: {0}")]
    MalformedProbeOutput(String),

    #[error("File exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to read upload body: {0}")]
    SourceFailed(String),

    #[error("Staging I/O error: {0}")]
    StagingIo(#[from] std::io::Error),

    #[error("Invalid tool path: {0}")]
    InvalidToolPath(String),

    #[error("{tool} not found")]
    ExternalToolMissing { tool: String },

    #[error("{tool} exited with code {exit_code:?}: {stderr}")]
    ExternalToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::InvalidMediaType(_) | ProcessingError::WrongMediaKind { .. } => {
                AppError::UnsupportedMediaType(err.to_string())
            }
            ProcessingError::NoStreamsFound => {
                AppError::InvalidInput("Uploaded file contains no media streams".to_string())
            }
            ProcessingError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            ProcessingError::SourceFailed(msg) => AppError::InvalidInput(msg),
            ProcessingError::StagingIo(e) => AppError::StagingIo(e.to_string()),
            ProcessingError::InvalidToolPath(msg) => AppError::Internal(msg),
            ProcessingError::MalformedProbeOutput(msg) => AppError::ExternalTool {
                tool: "ffprobe".to_string(),
                exit_code: Some(0),
                stderr: msg,
            },
            ProcessingError::ExternalToolMissing { tool } => AppError::ExternalToolMissing { tool },
            ProcessingError::ExternalToolFailed {
                tool,
                exit_code,
                stderr,
            } => AppError::ExternalTool {
                tool,
                exit_code,
                stderr,
            },
        }
    }
}
