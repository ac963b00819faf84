use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Writes go to a uniquely named `.partial` sibling first and are renamed
/// into place once synced, so readers never observe a half-written file.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tubely/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/media")
    /// * `bucket` - Logical bucket name recorded in stored references
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: impl Into<String>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            bucket: bucket.into(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Public URL the static file server exposes for a key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Convert storage key to filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(format!(
                "Storage key {:?} contains invalid characters",
                storage_key
            )));
        }

        Ok(self.base_path.join(storage_key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{}.partial", Uuid::new_v4()));
        PathBuf::from(name)
    }

    /// Move a fully written temporary file over its final path.
    async fn commit(&self, partial: &Path, path: &Path) -> StorageResult<()> {
        if let Err(e) = fs::rename(partial, path).await {
            let _ = fs::remove_file(partial).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move file into place at {}: {}",
                path.display(),
                e
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn upload_file(
        &self,
        storage_key: &str,
        source: &Path,
        _content_type: &str,
    ) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let partial = Self::partial_path(&path);

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let copy = async {
            let size = fs::copy(source, &partial).await?;
            fs::File::open(&partial).await?.sync_all().await?;
            Ok::<u64, std::io::Error>(size)
        };

        let size = match copy.await {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                tracing::error!(
                    error = %e,
                    source = %source.display(),
                    key = %storage_key,
                    "Local storage file upload failed"
                );
                return Err(StorageError::UploadFailed(format!(
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    path.display(),
                    e
                )));
            }
        };

        self.commit(&partial, &path).await?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage file upload successful"
        );

        Ok(size)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        Ok(self.public_url(storage_key))
    }

    async fn check_access(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.base_path).await?;
        if !metadata.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:8091/media/".to_string(), "local")
            .await
            .unwrap()
    }

    fn source_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_file_writes_file() {
        let dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        let source = source_file(source_dir.path(), "in.png", b"png-bytes");
        let storage = storage(dir.path()).await;

        let size = storage
            .upload_file("abc.png", &source, "image/png")
            .await
            .unwrap();

        assert_eq!(size, 9);
        let written = std::fs::read(dir.path().join("abc.png")).unwrap();
        assert_eq!(written, b"png-bytes");
        assert!(storage.exists("abc.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_file_creates_nested_dirs_and_leaves_no_partials() {
        let dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        let source = source_dir.path().join("input.mp4");
        std::fs::write(&source, vec![7u8; 4096]).unwrap();

        let storage = storage(dir.path()).await;
        let size = storage
            .upload_file("landscape/abc.mp4", &source, "video/mp4")
            .await
            .unwrap();

        assert_eq!(size, 4096);
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("landscape"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["abc.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_reupload_overwrites() {
        let dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        let first = source_file(source_dir.path(), "first.png", b"first");
        let second = source_file(source_dir.path(), "second.png", b"second");
        let storage = storage(dir.path()).await;

        storage
            .upload_file("thumb.png", &first, "image/png")
            .await
            .unwrap();
        storage
            .upload_file("thumb.png", &second, "image/png")
            .await
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join("thumb.png")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_missing_source_fails_without_creating_key() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let err = storage
            .upload_file("other/x.mp4", Path::new("/nonexistent/input.mp4"), "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(!storage.exists("other/x.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        let source = source_file(source_dir.path(), "x.png", b"x");
        let storage = storage(dir.path()).await;

        for key in ["../escape.png", "/etc/passwd", "a\\b.png", ""] {
            let err = storage
                .upload_file(key, &source, "image/png")
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {:?}", key);
        }
    }

    #[tokio::test]
    async fn test_presigned_url_is_public_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let url = storage
            .get_presigned_url("portrait/abc.mp4", Duration::from_secs(900))
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8091/media/portrait/abc.mp4");
        assert_eq!(storage.bucket(), "local");
        storage.check_access().await.unwrap();
    }
}
