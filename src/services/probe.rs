use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Coarse aspect-ratio bucket assigned once per upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
    Other,
}

impl AspectRatio {
    /// Exact integer-ratio test; near-16:9 footage such as 1918x1080 is `Other`.
    pub fn from_dimensions(width: i64, height: i64) -> Self {
        if width == 16 * height / 9 {
            AspectRatio::Landscape
        } else if height == 16 * width / 9 {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn ratio(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Other => "other",
        }
    }

    /// Key prefix the published object lives under.
    pub fn classification(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ratio())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamGeometry {
    pub width: i64,
    pub height: i64,
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("no video stream found")]
    NoMediaStream,

    #[error("couldn't run ffprobe: {0}")]
    ProbeExecutionFailed(String),

    #[error("couldn't parse ffprobe output: {0}")]
    ProbeOutputInvalid(#[from] serde_json::Error),
}

/// Read-only inspection of a local media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Width and height of the first video stream.
    async fn probe_geometry(&self, path: &Path) -> Result<StreamGeometry, ProbeError>;

    async fn aspect_ratio(&self, path: &Path) -> Result<AspectRatio, ProbeError> {
        let geometry = self.probe_geometry(path).await?;
        Ok(AspectRatio::from_dimensions(geometry.width, geometry.height))
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<i64>,
    height: Option<i64>,
}

/// Extracts the first video stream's geometry from `ffprobe -print_format json` output.
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamGeometry, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;

    let stream = output.streams.first().ok_or(ProbeError::NoMediaStream)?;
    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Ok(StreamGeometry { width, height })
        }
        _ => Err(ProbeError::NoMediaStream),
    }
}

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe_geometry(&self, path: &Path) -> Result<StreamGeometry, ProbeError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::ProbeExecutionFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(ProbeError::ProbeExecutionFailed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let geometry = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            width = geometry.width,
            height = geometry.height,
            "Video probe completed"
        );

        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ratios() {
        assert_eq!(AspectRatio::from_dimensions(1920, 1080), AspectRatio::Landscape);
        assert_eq!(AspectRatio::from_dimensions(1280, 720), AspectRatio::Landscape);
        assert_eq!(AspectRatio::from_dimensions(1080, 1920), AspectRatio::Portrait);
        assert_eq!(AspectRatio::from_dimensions(720, 1280), AspectRatio::Portrait);
        assert_eq!(AspectRatio::from_dimensions(1000, 1000), AspectRatio::Other);
        assert_eq!(AspectRatio::from_dimensions(640, 480), AspectRatio::Other);
    }

    #[test]
    fn test_near_matches_are_other() {
        assert_eq!(AspectRatio::from_dimensions(1918, 1080), AspectRatio::Other);
        assert_eq!(AspectRatio::from_dimensions(1080, 1918), AspectRatio::Other);
    }

    #[test]
    fn test_integer_division_matches_exactly() {
        // 16 * 1079 / 9 truncates to 1918
        assert_eq!(AspectRatio::from_dimensions(1918, 1079), AspectRatio::Landscape);
        for height in 1..2000i64 {
            let width = 16 * height / 9;
            assert_eq!(AspectRatio::from_dimensions(width, height), AspectRatio::Landscape);
        }
    }

    #[test]
    fn test_ratio_labels() {
        assert_eq!(AspectRatio::Landscape.to_string(), "16:9");
        assert_eq!(AspectRatio::Portrait.ratio(), "9:16");
        assert_eq!(AspectRatio::Other.classification(), "other");
        assert_eq!(AspectRatio::Portrait.classification(), "portrait");
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":1920,"height":1080}]}"#;
        let geometry = parse_probe_output(json).unwrap();
        assert_eq!(geometry, StreamGeometry { width: 1920, height: 1080 });
    }

    #[test]
    fn test_parse_probe_output_no_stream() {
        assert!(matches!(
            parse_probe_output(br#"{"streams":[]}"#),
            Err(ProbeError::NoMediaStream)
        ));
        assert!(matches!(
            parse_probe_output(br#"{}"#),
            Err(ProbeError::NoMediaStream)
        ));
        assert!(matches!(
            parse_probe_output(br#"{"streams":[{"codec_type":"audio"}]}"#),
            Err(ProbeError::NoMediaStream)
        ));
    }

    #[test]
    fn test_parse_probe_output_invalid() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(ProbeError::ProbeOutputInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_failure() {
        let prober = FfprobeProber::new("/nonexistent/ffprobe");
        let result = prober.probe_geometry(Path::new("/tmp/none.mp4")).await;
        assert!(matches!(result, Err(ProbeError::ProbeExecutionFailed(_))));
    }
}
