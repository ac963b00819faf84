//! Fast-Start Rewriter
//!
//! Moves an mp4's `moov` index ahead of the media payload with a stream
//! copy, so playback can begin before the download completes.

use crate::cleanup::CleanupStack;
use crate::error::ProcessingResult;
use crate::toolchain::MediaToolchain;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sibling path the rewritten file is written to: `{stem}-faststart.mp4`.
pub fn faststart_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    input.with_file_name(format!("{}-faststart.mp4", stem))
}

#[derive(Clone)]
pub struct FastStartRewriter {
    toolchain: Arc<dyn MediaToolchain>,
}

impl FastStartRewriter {
    pub fn new(toolchain: Arc<dyn MediaToolchain>) -> Self {
        Self { toolchain }
    }

    /// Rewrite `input` and return the path of the rewritten copy.
    ///
    /// The output path is registered on `cleanup` before the tool runs, so a
    /// partially written output is removed along with a complete one.
    #[tracing::instrument(skip(self, input, cleanup), fields(input = %input.display()))]
    pub async fn rewrite_for_progressive_playback(
        &self,
        input: &Path,
        cleanup: &mut CleanupStack,
    ) -> ProcessingResult<PathBuf> {
        let output = faststart_output_path(input);
        cleanup.remove_file(output.clone());

        let start = std::time::Instant::now();
        self.toolchain.remux(input, &output).await?;

        tracing::info!(
            output = %output.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Rewrote video for fast start"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use async_trait::async_trait;

    /// Copies input to output, optionally failing after the write.
    struct WritingToolchain {
        fail: bool,
    }

    #[async_trait]
    impl MediaToolchain for WritingToolchain {
        async fn remux(&self, input: &Path, output: &Path) -> ProcessingResult<()> {
            let data = tokio::fs::read(input).await?;
            tokio::fs::write(output, data).await?;
            if self.fail {
                return Err(ProcessingError::ExternalToolFailed {
                    tool: "ffmpeg".into(),
                    exit_code: Some(1),
                    stderr: "moov atom not found".into(),
                });
            }
            Ok(())
        }

        async fn probe(&self, _input: &Path) -> ProcessingResult<Vec<u8>> {
            Ok(br#"{"streams":[]}"#.to_vec())
        }
    }

    #[test]
    fn test_output_is_a_sibling() {
        assert_eq!(
            faststart_output_path(Path::new("/tmp/tubely-abc.mp4")),
            PathBuf::from("/tmp/tubely-abc-faststart.mp4")
        );
        assert_eq!(
            faststart_output_path(Path::new("/tmp/tubely-abc")),
            PathBuf::from("/tmp/tubely-abc-faststart.mp4")
        );
    }

    #[tokio::test]
    async fn test_output_removed_when_cleanup_runs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tubely-in.mp4");
        std::fs::write(&input, b"video").unwrap();

        let rewriter = FastStartRewriter::new(Arc::new(WritingToolchain { fail: false }));
        let mut cleanup = CleanupStack::new();
        let output = rewriter
            .rewrite_for_progressive_playback(&input, &mut cleanup)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"video");
        drop(cleanup);
        assert!(!output.exists());
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_partial_output_removed_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tubely-in.mp4");
        std::fs::write(&input, b"video").unwrap();

        let rewriter = FastStartRewriter::new(Arc::new(WritingToolchain { fail: true }));
        let mut cleanup = CleanupStack::new();
        let err = rewriter
            .rewrite_for_progressive_playback(&input, &mut cleanup)
            .await
            .unwrap_err();
        assert!(faststart_output_path(&input).exists());
        drop(cleanup);

        assert!(matches!(err, ProcessingError::ExternalToolFailed { .. }));
        assert!(!faststart_output_path(&input).exists());
    }
}
