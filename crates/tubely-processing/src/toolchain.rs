//! External media tools.
//!
//! The pipeline only needs two things from ffmpeg/ffprobe, a stream-copy
//! remux and a stream probe, so both sit behind [`MediaToolchain`]. Tests
//! substitute a fake that returns canned reports and failures.

use crate::error::{ProcessingError, ProcessingResult};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Stderr kept in errors is capped to the tail of the output.
const MAX_STDERR_BYTES: usize = 4096;

#[async_trait]
pub trait MediaToolchain: Send + Sync {
    /// Copy every stream of `input` into an mp4 at `output` with the index
    /// moved to the front. No re-encoding.
    async fn remux(&self, input: &Path, output: &Path) -> ProcessingResult<()>;

    /// Return the JSON stream report for `input`.
    async fn probe(&self, input: &Path) -> ProcessingResult<Vec<u8>>;
}

fn validate_tool_path(path: &str) -> ProcessingResult<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ProcessingError::InvalidToolPath(format!(
            "Tool path contains dangerous characters: {:?}",
            path
        )));
    }

    if path.contains("..") {
        return Err(ProcessingError::InvalidToolPath(format!(
            "Tool path contains directory traversal: {:?}",
            path
        )));
    }

    Ok(())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= MAX_STDERR_BYTES {
        return text.to_string();
    }
    let mut cut = text.len() - MAX_STDERR_BYTES;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    format!("...{}", &text[cut..])
}

/// ffmpeg/ffprobe invoked as subprocesses.
#[derive(Debug, Clone)]
pub struct FfmpegToolchain {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegToolchain {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> ProcessingResult<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffmpeg_path)?;
        validate_tool_path(&ffprobe_path)?;

        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
        })
    }

    /// Run `program` to completion and return its stdout.
    ///
    /// A spawn that fails with `NotFound` means the tool is not installed,
    /// which is reported apart from a tool that ran and failed. The child is
    /// killed if the calling future is dropped.
    async fn run(&self, tool: &str, program: &str, args: &[&OsStr]) -> ProcessingResult<Vec<u8>> {
        let start = std::time::Instant::now();

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    tracing::error!(tool = %tool, program = %program, "Media tool not found");
                    ProcessingError::ExternalToolMissing {
                        tool: tool.to_string(),
                    }
                }
                _ => ProcessingError::ExternalToolFailed {
                    tool: tool.to_string(),
                    exit_code: None,
                    stderr: format!("failed to spawn {}: {}", program, e),
                },
            })?;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            tracing::warn!(
                tool = %tool,
                exit_code = ?output.status.code(),
                stderr = %stderr,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Media tool exited unsuccessfully"
            );
            return Err(ProcessingError::ExternalToolFailed {
                tool: tool.to_string(),
                exit_code: output.status.code(),
                stderr,
            });
        }

        tracing::debug!(
            tool = %tool,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Media tool finished"
        );

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaToolchain for FfmpegToolchain {
    async fn remux(&self, input: &Path, output: &Path) -> ProcessingResult<()> {
        let args: [&OsStr; 9] = [
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output.as_os_str(),
        ];
        self.run("ffmpeg", &self.ffmpeg_path, &args).await.map(|_| ())
    }

    async fn probe(&self, input: &Path) -> ProcessingResult<Vec<u8>> {
        let args: [&OsStr; 8] = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_streams"),
            input.as_os_str(),
            OsStr::new("-show_entries"),
            OsStr::new("stream=display_aspect_ratio"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
        ];
        self.run("ffprobe", &self.ffprobe_path, &args).await
    }
}
