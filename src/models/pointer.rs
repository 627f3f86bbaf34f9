use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Durable locator of a published video: `"{bucket},{key}"` in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPointer {
    pub bucket: String,
    pub key: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer has no ',' separator: {0:?}")]
    MissingSeparator(String),

    #[error("pointer has an empty bucket: {0:?}")]
    EmptyBucket(String),

    #[error("pointer has an empty key: {0:?}")]
    EmptyKey(String),
}

impl VideoPointer {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for VideoPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

impl FromStr for VideoPointer {
    type Err = PointerError;

    /// Splits on the first comma only; object keys may contain commas, buckets may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bucket, key) = s
            .split_once(',')
            .ok_or_else(|| PointerError::MissingSeparator(s.to_string()))?;

        if bucket.is_empty() {
            return Err(PointerError::EmptyBucket(s.to_string()));
        }
        if key.is_empty() {
            return Err(PointerError::EmptyKey(s.to_string()));
        }

        Ok(Self::new(bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pointer() {
        let pointer = VideoPointer::new("tubely", "landscape/abc.mp4");
        assert_eq!(pointer.to_string(), "tubely,landscape/abc.mp4");
    }

    #[test]
    fn test_parse_splits_on_first_comma() {
        let pointer: VideoPointer = "tubely,portrait/a,b.mp4".parse().unwrap();
        assert_eq!(pointer.bucket, "tubely");
        assert_eq!(pointer.key, "portrait/a,b.mp4");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "https://example.com/video.mp4".parse::<VideoPointer>(),
            Err(PointerError::MissingSeparator(
                "https://example.com/video.mp4".to_string()
            ))
        );
        assert!(matches!(
            ",landscape/x.mp4".parse::<VideoPointer>(),
            Err(PointerError::EmptyBucket(_))
        ));
        assert!(matches!(
            "tubely,".parse::<VideoPointer>(),
            Err(PointerError::EmptyKey(_))
        ));
    }
}
