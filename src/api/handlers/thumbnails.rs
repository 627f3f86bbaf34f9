use crate::AppState;
use crate::api::error::AppError;
use crate::models::VideoResponse;
use crate::services::ingest::validate_media_type;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const THUMBNAIL_FIELD: &str = "thumbnail";
const SUPPORTED_THUMBNAIL_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Inline `data:` URL embedding the image in the record.
pub fn thumbnail_data_url(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    request_body(content = Multipart, description = "Multipart form with a JPEG or PNG in the `thumbnail` field"),
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Invalid ID or media type"),
        (status = 401, description = "Missing credential or not the owner"),
        (status = 413, description = "Thumbnail too large")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    let mut video = state.ingest.authorize(&video_id, &claims.sub).await?;

    let mut thumbnail = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Thumbnail exceeds the maximum allowed size".to_string())
        } else {
            AppError::BadRequest(format!("Unable to parse form file: {}", e.body_text()))
        }
    })? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let media_type = validate_media_type(field.content_type(), SUPPORTED_THUMBNAIL_TYPES)?;
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge("Thumbnail exceeds the maximum allowed size".to_string())
            } else {
                AppError::BadRequest(format!("Couldn't read thumbnail: {}", e.body_text()))
            }
        })?;
        thumbnail = Some((media_type, data));
        break;
    }

    let (media_type, data) = thumbnail.ok_or_else(|| {
        AppError::BadRequest("Unable to parse form file: missing `thumbnail` field".to_string())
    })?;

    if data.len() > state.config.max_thumbnail_size {
        return Err(AppError::PayloadTooLarge(
            "Thumbnail exceeds the maximum allowed size".to_string(),
        ));
    }

    video.thumbnail_url = Some(thumbnail_data_url(&media_type, &data));
    let updated = state.videos.update_video(video).await.map_err(|e| {
        AppError::Internal(format!("Couldn't update video's thumbnail URL: {}", e))
    })?;

    tracing::info!(
        video_id = %updated.id,
        bytes = data.len(),
        "Thumbnail stored"
    );

    let signed = state.ingest.sign(updated).await;
    Ok(Json(VideoResponse::from(signed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_data_url() {
        assert_eq!(
            thumbnail_data_url("image/png", b"\x89PNG"),
            "data:image/png;base64,iVBORw=="
        );
    }
}
