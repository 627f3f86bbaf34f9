use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

const PROCESSING_SUFFIX: &str = ".processing";

#[derive(Error, Debug)]
pub enum RemuxError {
    #[error("couldn't process video with ffmpeg: {0}")]
    RemuxFailed(String),
}

/// Deterministic output location of a remux: the input path plus `.processing`.
pub fn processing_path(input: &Path) -> PathBuf {
    let mut path = OsString::from(input.as_os_str());
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

/// Rewrites a container for progressive playback without re-encoding its streams.
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Writes the fast-start copy to [`processing_path`] of `input` and returns that path.
    async fn remux_for_fast_start(&self, input: &Path) -> Result<PathBuf, RemuxError>;
}

pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn remux_for_fast_start(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        let start = std::time::Instant::now();
        let output_path = processing_path(input);

        // Stream copy only; moov atom moved to the front. A dropped request kills ffmpeg
        // so nothing is written after the artifact guard has run.
        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RemuxError::RemuxFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(RemuxError::RemuxFailed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            output = %output_path.display(),
            "Fast-start remux completed"
        );

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_path() {
        assert_eq!(
            processing_path(Path::new("/tmp/tubely-upload-abc.mp4")),
            PathBuf::from("/tmp/tubely-upload-abc.mp4.processing")
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_remux_failure() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        let result = transcoder
            .remux_for_fast_start(Path::new("/tmp/none.mp4"))
            .await;
        assert!(matches!(result, Err(RemuxError::RemuxFailed(_))));
    }
}
