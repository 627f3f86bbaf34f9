#![cfg(unix)]

use async_trait::async_trait;
use sea_orm::Database;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tubely::config::AppConfig;
use tubely::infrastructure::database;
use tubely::services::ingest::IngestService;
use tubely::services::probe::{MediaProber, ProbeError, StreamGeometry};
use tubely::services::remux::FfmpegTranscoder;
use tubely::services::storage::StorageService;
use tubely::services::video_store::{SeaOrmVideoRepository, VideoRepository};

struct NullStorage;

#[async_trait]
impl StorageService for NullStorage {
    fn bucket(&self) -> &str {
        "tubely-test"
    }

    async fn upload_path(&self, _key: &str, _path: &Path, _content_type: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> anyhow::Result<String> {
        Ok(format!("https://{}.s3.mock/{}", bucket, key))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

struct LandscapeProber;

#[async_trait]
impl MediaProber for LandscapeProber {
    async fn probe_geometry(&self, _path: &Path) -> Result<StreamGeometry, ProbeError> {
        Ok(StreamGeometry {
            width: 1920,
            height: 1080,
        })
    }
}

/// Stand-in for ffmpeg that stalls, then writes its output argument.
fn slow_ffmpeg(dir: &Path) -> String {
    let script = dir.join("slow-ffmpeg.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\nsleep 1\nfor last; do :; done\necho remuxed > \"$last\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_dropped_request_leaves_no_artifacts() {
    let tools = tempfile::tempdir().unwrap();
    let assets = tempfile::tempdir().unwrap();

    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    let repo = Arc::new(SeaOrmVideoRepository::new(db));

    let config = AppConfig {
        assets_root: assets.path().to_path_buf(),
        ..AppConfig::development()
    };
    let ingest = IngestService::new(
        repo.clone(),
        Arc::new(NullStorage),
        Arc::new(FfmpegTranscoder::new(slow_ffmpeg(tools.path()))),
        Arc::new(LandscapeProber),
        config,
    );

    let video = repo.create_video("alice", "clip".into(), None).await.unwrap();
    let staged = ingest.stage_upload(&b"not really an mp4"[..]).await.unwrap();

    // The client goes away while ffmpeg is still running
    let result = tokio::time::timeout(
        Duration::from_millis(200),
        ingest.publish(video, staged.path(), "video/mp4"),
    )
    .await;
    assert!(result.is_err(), "publish should still be remuxing");
    drop(staged);

    // Past the point where the stalled tool would have written its output
    tokio::time::sleep(Duration::from_millis(2000)).await;

    let leftovers: Vec<_> = std::fs::read_dir(assets.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "leftover files in assets root: {:?}", leftovers);
}
