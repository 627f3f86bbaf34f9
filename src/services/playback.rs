use crate::entities::videos;
use crate::models::VideoPointer;
use crate::services::storage::StorageService;
use std::time::Duration;

/// Replaces the stored `bucket,key` pointer with a freshly signed URL.
///
/// Only the returned copy is rewritten; the stored record keeps the pointer.
/// When the pointer is malformed or signing fails the record is returned as stored.
pub async fn sign_video(
    storage: &dyn StorageService,
    mut video: videos::Model,
    expires_in: Duration,
) -> videos::Model {
    let Some(raw) = video.video_url.as_deref() else {
        return video;
    };

    let pointer = match raw.parse::<VideoPointer>() {
        Ok(pointer) => pointer,
        Err(e) => {
            tracing::warn!(video_id = %video.id, "Stored video pointer is malformed: {}", e);
            return video;
        }
    };

    match storage
        .presigned_get_url(&pointer.bucket, &pointer.key, expires_in)
        .await
    {
        Ok(url) => video.video_url = Some(url),
        Err(e) => {
            tracing::warn!(video_id = %video.id, "Couldn't presign video URL: {}", e);
        }
    }

    video
}
