//! Local Staging Manager
//!
//! Request bodies are copied to a uniquely named scratch file before any
//! processing. The file is owned by a [`StagingFile`] and removed when that
//! handle is dropped, whichever way the request ends. A failed or oversized
//! copy removes the file before returning.

use crate::error::{ProcessingError, ProcessingResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

const STAGING_PREFIX: &str = "tubely-";

/// Where staging files are created.
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    dir: Option<PathBuf>,
}

impl StagingArea {
    /// `None` stages into the OS temp directory.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Copy `source` into a new staging file.
    ///
    /// Fails with `PayloadTooLarge` as soon as more than `max_bytes` have
    /// arrived, with `SourceFailed` when the stream yields an error, and with
    /// `StagingIo` when the disk write fails. `suffix` is appended to the
    /// file name (e.g. `.mp4`).
    pub async fn stage<S, E>(
        &self,
        source: S,
        max_bytes: u64,
        suffix: &str,
    ) -> ProcessingResult<StagingFile>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let start = std::time::Instant::now();
        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(suffix)
            .tempfile_in(self.dir())?;

        // `path` is declared first so it outlives the open handle on early return.
        let (std_file, path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut source = std::pin::pin!(source);
        let mut written: u64 = 0;

        while let Some(chunk) = source.next().await {
            let chunk = chunk.map_err(|e| ProcessingError::SourceFailed(e.to_string()))?;
            written += chunk.len() as u64;
            if written > max_bytes {
                tracing::debug!(
                    path = %path.display(),
                    limit_bytes = max_bytes,
                    "Upload exceeded size limit while staging"
                );
                return Err(ProcessingError::PayloadTooLarge { limit: max_bytes });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tracing::debug!(
            path = %path.display(),
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Staged upload to disk"
        );

        Ok(StagingFile { path, size: written })
    }
}

/// A staged upload on local disk, deleted on drop.
#[derive(Debug)]
pub struct StagingFile {
    path: TempPath,
    size: u64,
}

impl StagingFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open the staged bytes for reading from the start.
    pub async fn reopen(&self) -> ProcessingResult<tokio::fs::File> {
        Ok(tokio::fs::File::open(&self.path).await?)
    }

    /// Read the whole staged file into memory.
    pub async fn read_all(&self) -> ProcessingResult<Bytes> {
        Ok(Bytes::from(tokio::fs::read(&self.path).await?))
    }

    /// Remove the file now and report a failure to do so.
    pub fn close(self) -> ProcessingResult<()> {
        Ok(self.path.close()?)
    }
}
