use crate::AppState;
use crate::api::error::AppError;
use crate::models::{CreateVideoRequest, VideoResponse};
use crate::services::ingest::{IngestError, SUPPORTED_VIDEO_TYPES, validate_media_type};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header::CONTENT_LENGTH},
};
use futures::{TryStreamExt, future::join_all};
use std::io;
use tokio_util::io::StreamReader;

const VIDEO_FIELD: &str = "video";

fn multipart_to_io(e: MultipartError) -> io::Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::new(io::ErrorKind::FileTooLarge, e)
    } else {
        io::Error::other(e)
    }
}

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IngestError::PayloadTooLarge(limit).into()
    } else {
        AppError::BadRequest(format!("Unable to parse form file: {}", e.body_text()))
    }
}

#[utoipa::path(
    post,
    path = "/videos/{video_id}/upload",
    request_body(content = Multipart, description = "Multipart form with an MP4 in the `video` field"),
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video published", body = VideoResponse),
        (status = 400, description = "Invalid ID or media type"),
        (status = 401, description = "Missing credential or not the owner"),
        (status = 413, description = "Upload exceeds the size ceiling"),
        (status = 500, description = "Processing or publication failed")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    let limit = state.config.max_upload_size;

    // Reject declared oversize bodies before reading anything.
    let declared_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared_length.is_some_and(|len| len > limit as u64) {
        return Err(IngestError::PayloadTooLarge(limit).into());
    }

    let video = state.ingest.authorize(&video_id, &claims.sub).await?;

    tracing::info!(
        video_id = %video.id,
        user_id = %claims.sub,
        "Uploading video"
    );

    let result: Result<Json<VideoResponse>, AppError> = async {
        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, limit))?
        {
            if field.name() != Some(VIDEO_FIELD) {
                continue;
            }

            let media_type = validate_media_type(field.content_type(), SUPPORTED_VIDEO_TYPES)?;

            let reader = StreamReader::new(field.map_err(multipart_to_io));
            let staged = state.ingest.stage_upload(reader).await?;
            upload = Some((staged, media_type));
            break;
        }

        let (staged, media_type) = upload.ok_or_else(|| {
            AppError::BadRequest("Unable to parse form file: missing `video` field".to_string())
        })?;

        let published = state
            .ingest
            .publish(video, staged.path(), &media_type)
            .await?;

        Ok(Json(VideoResponse::from(published)))
    }
    .await;

    if let Err(e) = &result {
        // Drain the rest of the body so the client sees the response instead of a reset.
        tracing::debug!("Upload failed: {}. Consuming remaining stream...", e);
        while let Ok(Some(mut field)) = multipart.next_field().await {
            while let Ok(Some(_)) = field.chunk().await {}
        }
    }

    result
}

#[utoipa::path(
    post,
    path = "/api/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video draft created", body = VideoResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn create_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let video = state
        .videos
        .create_video(&claims.sub, title.to_string(), req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(video))))
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video with a signed playback URL", body = VideoResponse),
        (status = 400, description = "Invalid ID"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = state.ingest.authorize(&video_id, &claims.sub).await?;
    let signed = state.ingest.sign(video).await;
    Ok(Json(VideoResponse::from(signed)))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    responses(
        (status = 200, description = "Caller's videos, newest first", body = Vec<VideoResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let videos = state.videos.list_videos(&claims.sub).await?;

    let signed = join_all(videos.into_iter().map(|v| state.ingest.sign(v))).await;

    Ok(Json(signed.into_iter().map(VideoResponse::from).collect()))
}
