use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Object {key} belongs to bucket {found:?}, expected {expected:?}")]
    ForeignBucket {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Every write is a whole-object write: a key only becomes readable once the
/// full object has been accepted, so a failed upload never leaves a partial
/// object under its key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket name written into stored references for objects of this backend.
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Upload the contents of a local file under an explicit key.
    ///
    /// Returns the number of bytes written.
    async fn upload_file(
        &self,
        storage_key: &str,
        source: &Path,
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Check if a file exists in storage
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Generate a time-limited read URL for one object.
    ///
    /// Backends without signing (local) return their public URL.
    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Verify the backend is reachable with the configured credentials.
    async fn check_access(&self) -> StorageResult<()>;
}
