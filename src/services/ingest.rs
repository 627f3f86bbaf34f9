//! Video ingestion pipeline.
//!
//! A request moves through `Validating → Staging → Remuxing → Probing →
//! Publishing → RecordUpdating → Done`; any failure aborts the request. The
//! staged upload and the remuxed artifact are removed on every exit path.

use crate::config::AppConfig;
use crate::entities::videos;
use crate::models::VideoPointer;
use crate::services::keys::video_key;
use crate::services::playback::sign_video;
use crate::services::probe::{MediaProber, ProbeError};
use crate::services::remux::{MediaTranscoder, RemuxError, processing_path};
use crate::services::storage::StorageService;
use crate::services::video_store::VideoRepository;
use crate::utils::temp::TempArtifact;
use sea_orm::DbErr;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

pub const SUPPORTED_VIDEO_TYPES: &[&str] = &["video/mp4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Validating,
    Staging,
    Remuxing,
    Probing,
    Publishing,
    RecordUpdating,
    Done,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Validating => "validating",
            IngestStage::Staging => "staging",
            IngestStage::Remuxing => "remuxing",
            IngestStage::Probing => "probing",
            IngestStage::Publishing => "publishing",
            IngestStage::RecordUpdating => "record_updating",
            IngestStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid ID")]
    InvalidId,

    #[error("Video not found")]
    VideoNotFound,

    #[error("You can't do that")]
    NotOwner,

    #[error("Couldn't retrieve video: {0}")]
    Lookup(#[source] DbErr),

    #[error("Bad Content-Type: {0}")]
    BadMediaType(String),

    #[error("Not allowed media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload exceeds the maximum size of {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Couldn't stage upload: {0}")]
    Staging(#[source] io::Error),

    #[error(transparent)]
    Remux(#[from] RemuxError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("Couldn't upload video to object storage: {0}")]
    PublishFailed(anyhow::Error),

    /// The object is published but unreferenced.
    #[error("Couldn't update video record (published object {key} is orphaned): {source}")]
    RecordUpdate {
        key: String,
        #[source]
        source: DbErr,
    },
}

impl IngestError {
    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::InvalidId
            | IngestError::VideoNotFound
            | IngestError::NotOwner
            | IngestError::Lookup(_)
            | IngestError::BadMediaType(_)
            | IngestError::UnsupportedMediaType(_) => IngestStage::Validating,
            IngestError::PayloadTooLarge(_) | IngestError::Staging(_) => IngestStage::Staging,
            IngestError::Remux(_) => IngestStage::Remuxing,
            IngestError::Probe(_) => IngestStage::Probing,
            IngestError::PublishFailed(_) => IngestStage::Publishing,
            IngestError::RecordUpdate { .. } => IngestStage::RecordUpdating,
        }
    }
}

/// Parses the declared content type of the uploaded part and checks it against `allowed`.
pub fn validate_media_type(declared: Option<&str>, allowed: &[&str]) -> Result<String, IngestError> {
    let declared = declared.unwrap_or_default();
    let parsed: mime::Mime = declared
        .parse()
        .map_err(|_| IngestError::BadMediaType(declared.to_string()))?;
    let media_type = parsed.essence_str().to_string();

    if !allowed.contains(&media_type.as_str()) {
        return Err(IngestError::UnsupportedMediaType(media_type));
    }
    Ok(media_type)
}

pub struct IngestService {
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn StorageService>,
    transcoder: Arc<dyn MediaTranscoder>,
    prober: Arc<dyn MediaProber>,
    config: AppConfig,
}

impl IngestService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn StorageService>,
        transcoder: Arc<dyn MediaTranscoder>,
        prober: Arc<dyn MediaProber>,
        config: AppConfig,
    ) -> Self {
        Self {
            videos,
            storage,
            transcoder,
            prober,
            config,
        }
    }

    /// Loads the target record and checks the caller owns it.
    pub async fn authorize(&self, video_id: &str, user_id: &str) -> Result<videos::Model, IngestError> {
        let id = Uuid::parse_str(video_id).map_err(|_| IngestError::InvalidId)?;

        let video = self
            .videos
            .get_video(id)
            .await
            .map_err(IngestError::Lookup)?
            .ok_or(IngestError::VideoNotFound)?;

        if video.user_id != user_id {
            return Err(IngestError::NotOwner);
        }
        Ok(video)
    }

    /// Copies the upload into a fresh file under the asset root.
    ///
    /// At most `max_upload_size` bytes are accepted; the file is deleted when the
    /// returned handle is dropped.
    pub async fn stage_upload<R>(&self, reader: R) -> Result<NamedTempFile, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let limit = self.config.max_upload_size;

        let staged = tempfile::Builder::new()
            .prefix("tubely-upload-")
            .suffix(".mp4")
            .tempfile_in(&self.config.assets_root)
            .map_err(IngestError::Staging)?;

        let mut file = tokio::fs::File::from_std(staged.reopen().map_err(IngestError::Staging)?);
        let mut limited = reader.take(limit as u64 + 1);

        let copied = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::FileTooLarge => IngestError::PayloadTooLarge(limit),
                _ => IngestError::Staging(e),
            })?;

        if copied > limit as u64 {
            return Err(IngestError::PayloadTooLarge(limit));
        }

        file.flush().await.map_err(IngestError::Staging)?;

        tracing::debug!(
            path = %staged.path().display(),
            bytes = copied,
            "Upload staged"
        );
        Ok(staged)
    }

    /// Remuxes, classifies and publishes a staged upload, then points the record at it.
    ///
    /// Returns the updated record with its pointer replaced by a signed URL.
    pub async fn publish(
        &self,
        mut video: videos::Model,
        staged: &Path,
        media_type: &str,
    ) -> Result<videos::Model, IngestError> {
        let video_id = video.id.clone();

        log_stage(&video_id, IngestStage::Remuxing);
        let expected = TempArtifact::new(processing_path(staged));
        let processed = self.transcoder.remux_for_fast_start(staged).await?;
        let _processed_guard = (processed != expected.path()).then(|| TempArtifact::new(&processed));

        log_stage(&video_id, IngestStage::Probing);
        let aspect_ratio = self.prober.aspect_ratio(&processed).await?;

        log_stage(&video_id, IngestStage::Publishing);
        let key = video_key(aspect_ratio, media_type);
        self.storage
            .upload_path(&key, &processed, media_type)
            .await
            .map_err(IngestError::PublishFailed)?;

        log_stage(&video_id, IngestStage::RecordUpdating);
        let pointer = VideoPointer::new(self.storage.bucket(), key.clone());
        video.video_url = Some(pointer.to_string());

        let updated = self
            .videos
            .update_video(video)
            .await
            .map_err(|source| IngestError::RecordUpdate { key, source })?;

        tracing::info!(
            video_id = %video_id,
            stage = %IngestStage::Done,
            aspect_ratio = %aspect_ratio,
            pointer = %pointer,
            "Video published"
        );

        Ok(self.sign(updated).await)
    }

    pub async fn sign(&self, video: videos::Model) -> videos::Model {
        sign_video(self.storage.as_ref(), video, self.config.signed_url_ttl()).await
    }
}

fn log_stage(video_id: &str, stage: IngestStage) {
    tracing::info!(video_id = %video_id, stage = %stage, "Ingestion stage");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_media_type() {
        assert_eq!(
            validate_media_type(Some("video/mp4"), SUPPORTED_VIDEO_TYPES).unwrap(),
            "video/mp4"
        );
        assert_eq!(
            validate_media_type(Some("video/mp4; codecs=avc1"), SUPPORTED_VIDEO_TYPES).unwrap(),
            "video/mp4"
        );
    }

    #[test]
    fn test_validate_media_type_rejects() {
        assert!(matches!(
            validate_media_type(None, SUPPORTED_VIDEO_TYPES),
            Err(IngestError::BadMediaType(_))
        ));
        assert!(matches!(
            validate_media_type(Some("not a mime"), SUPPORTED_VIDEO_TYPES),
            Err(IngestError::BadMediaType(_))
        ));
        assert!(matches!(
            validate_media_type(Some("video/quicktime"), SUPPORTED_VIDEO_TYPES),
            Err(IngestError::UnsupportedMediaType(t)) if t == "video/quicktime"
        ));
    }

    #[test]
    fn test_error_stages() {
        assert_eq!(IngestError::NotOwner.stage(), IngestStage::Validating);
        assert_eq!(IngestError::PayloadTooLarge(1).stage(), IngestStage::Staging);
        assert_eq!(
            IngestError::Probe(ProbeError::NoMediaStream).stage(),
            IngestStage::Probing
        );
        assert_eq!(
            IngestError::PublishFailed(anyhow::anyhow!("denied")).stage(),
            IngestStage::Publishing
        );
        assert_eq!(IngestStage::RecordUpdating.to_string(), "record_updating");
    }
}
