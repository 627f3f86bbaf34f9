use crate::services::ingest::{IngestError, IngestStage};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    /// A pipeline stage failed; `message` is shown to the caller, `detail` is logged.
    #[error("{message}: {detail}")]
    Pipeline {
        stage: IngestStage,
        message: &'static str,
        detail: String,
    },
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        // Server-side failures are logged once, when the response is built.
        let pipeline = |message: &'static str, err: &IngestError| AppError::Pipeline {
            stage: err.stage(),
            message,
            detail: err.to_string(),
        };

        let rejected = |app: AppError, err: &IngestError| {
            tracing::debug!(stage = %err.stage(), "Upload rejected: {}", err);
            app
        };

        match &err {
            IngestError::InvalidId
            | IngestError::BadMediaType(_)
            | IngestError::UnsupportedMediaType(_) => {
                rejected(AppError::BadRequest(err.to_string()), &err)
            }
            IngestError::NotOwner => rejected(AppError::Unauthorized(err.to_string()), &err),
            IngestError::VideoNotFound => rejected(AppError::NotFound(err.to_string()), &err),
            IngestError::PayloadTooLarge(_) => {
                rejected(AppError::PayloadTooLarge(err.to_string()), &err)
            }
            IngestError::Lookup(_) => pipeline("Couldn't retrieve video", &err),
            IngestError::Staging(_) => pipeline("Couldn't stage uploaded video", &err),
            IngestError::Remux(_) => pipeline("Couldn't process video", &err),
            IngestError::Probe(_) => pipeline("Couldn't get aspect ratio of the video", &err),
            IngestError::PublishFailed(_) => {
                pipeline("Couldn't upload video to object storage", &err)
            }
            IngestError::RecordUpdate { .. } => pipeline("Couldn't update video", &err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Pipeline {
                stage,
                message,
                detail,
            } => {
                tracing::error!(stage = %stage, "{}: {}", message, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
