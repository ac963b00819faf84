//! Fake ffmpeg/ffprobe.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tubely_processing::{MediaToolchain, ProcessingError, ProcessingResult};

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Succeed,
    Missing,
    RemuxFails,
}

/// Copies input to output on remux and reports a canned aspect ratio on
/// probe. `None` reports a stream list with no streams.
#[derive(Debug, Clone)]
pub struct FakeToolchain {
    aspect_ratio: Option<String>,
    behavior: Behavior,
    remux_delay: Duration,
    remux_calls: Arc<AtomicUsize>,
    probed: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeToolchain {
    pub fn with_aspect_ratio(ratio: &str) -> Self {
        Self::new(Some(ratio.to_string()), Behavior::Succeed)
    }

    pub fn without_streams() -> Self {
        Self::new(None, Behavior::Succeed)
    }

    /// Behaves like a host without ffmpeg installed.
    pub fn missing() -> Self {
        Self::new(None, Behavior::Missing)
    }

    /// Writes a partial output, then exits non-zero.
    pub fn failing_remux() -> Self {
        Self::new(None, Behavior::RemuxFails)
    }

    fn new(aspect_ratio: Option<String>, behavior: Behavior) -> Self {
        Self {
            aspect_ratio,
            behavior,
            remux_delay: Duration::ZERO,
            remux_calls: Arc::new(AtomicUsize::new(0)),
            probed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Hold every remux for `delay` before writing the output.
    pub fn with_remux_delay(mut self, delay: Duration) -> Self {
        self.remux_delay = delay;
        self
    }

    pub fn remux_calls(&self) -> usize {
        self.remux_calls.load(Ordering::SeqCst)
    }

    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaToolchain for FakeToolchain {
    async fn remux(&self, input: &Path, output: &Path) -> ProcessingResult<()> {
        self.remux_calls.fetch_add(1, Ordering::SeqCst);
        if !self.remux_delay.is_zero() {
            tokio::time::sleep(self.remux_delay).await;
        }
        match self.behavior {
            Behavior::Missing => Err(ProcessingError::ExternalToolMissing {
                tool: "ffmpeg".to_string(),
            }),
            Behavior::RemuxFails => {
                tokio::fs::write(output, b"partial").await?;
                Err(ProcessingError::ExternalToolFailed {
                    tool: "ffmpeg".to_string(),
                    exit_code: Some(1),
                    stderr: "moov atom not found".to_string(),
                })
            }
            Behavior::Succeed => {
                tokio::fs::copy(input, output).await?;
                Ok(())
            }
        }
    }

    async fn probe(&self, input: &Path) -> ProcessingResult<Vec<u8>> {
        self.probed.lock().unwrap().push(input.to_path_buf());
        let report = match &self.aspect_ratio {
            Some(ratio) => serde_json::json!({
                "streams": [
                    { "index": 0, "codec_type": "video", "display_aspect_ratio": ratio },
                    { "index": 1, "codec_type": "audio" }
                ]
            }),
            None => serde_json::json!({ "streams": [] }),
        };
        Ok(serde_json::to_vec(&report).unwrap())
    }
}
