use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process-wide configuration for the video service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hard ceiling on an upload request body in bytes (default: 1 GiB)
    pub max_upload_size: usize,

    /// Ceiling on a thumbnail upload in bytes (default: 10 MiB)
    pub max_thumbnail_size: usize,

    /// Shared secret used to validate bearer tokens
    pub jwt_secret: String,

    /// Destination bucket for published videos
    pub s3_bucket: String,

    /// Bucket region (default: "us-east-1")
    pub s3_region: String,

    /// Custom S3 endpoint (MinIO, localstack). Uses path-style addressing when set.
    pub s3_endpoint: Option<String>,

    /// Static S3 credentials. Falls back to the default AWS provider chain when unset.
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    /// Local directory holding request-scoped staging files
    pub assets_root: PathBuf,

    /// ffmpeg binary used for remuxing (default: "ffmpeg")
    pub ffmpeg_path: String,

    /// ffprobe binary used for stream inspection (default: "ffprobe")
    pub ffprobe_path: String,

    /// Lifetime of signed playback URLs in seconds (default: 3600)
    pub signed_url_ttl_secs: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 1 << 30, // 1 GiB
            max_thumbnail_size: 10 << 20, // 10 MiB
            jwt_secret: "secret".to_string(),
            s3_bucket: "tubely".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            assets_root: PathBuf::from("./assets"),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            signed_url_ttl_secs: 3600,
            allowed_origins: vec![
                "http://localhost:8091".to_string(),
                "http://127.0.0.1:8091".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_thumbnail_size: env::var("MAX_THUMBNAIL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_thumbnail_size),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Fallback for dev convenience, strictly enforced in production()

            s3_bucket: env::var("S3_BUCKET").unwrap_or(default.s3_bucket),
            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),

            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.assets_root),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(default.ffprobe_path),

            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.signed_url_ttl_secs),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Config for local development and tests: staging under the system temp dir
    pub fn development() -> Self {
        Self {
            assets_root: env::temp_dir().join("tubely-assets"),
            ..Self::default()
        }
    }

    /// Config for production. Refuses to start without an explicit JWT secret.
    pub fn production() -> anyhow::Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: JWT_SECRET must be set"))?;
        Ok(Self {
            jwt_secret: secret,
            ..Self::from_env()
        })
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_size, 1024 * 1024 * 1024);
        assert_eq!(config.max_thumbnail_size, 10 * 1024 * 1024);
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(3600));
        assert_eq!(config.ffprobe_path, "ffprobe");
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert!(config.assets_root.starts_with(env::temp_dir()));
        assert_eq!(config.max_upload_size, AppConfig::default().max_upload_size);
    }

    #[test]
    fn test_production_config_requires_secret() {
        unsafe { env::set_var("JWT_SECRET", "test_secret") };
        let config = AppConfig::production().unwrap();
        unsafe { env::remove_var("JWT_SECRET") };
        assert_eq!(config.jwt_secret, "test_secret");

        assert!(AppConfig::production().is_err());
    }
}
