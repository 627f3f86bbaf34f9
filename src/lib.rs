pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::ingest::IngestService;
use crate::services::storage::StorageService;
use crate::services::video_store::VideoRepository;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::videos::upload_video,
        api::handlers::videos::create_video,
        api::handlers::videos::get_video,
        api::handlers::videos::list_videos,
        api::handlers::thumbnails::upload_thumbnail,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            models::VideoResponse,
            models::CreateVideoRequest,
        )
    ),
    modifiers(&JwtSecurity),
    tags(
        (name = "videos", description = "Video ingestion and playback"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

struct JwtSecurity;

impl Modify for JwtSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn StorageService>,
    pub ingest: Arc<IngestService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let auth = || from_fn_with_state(state.clone(), api::middleware::auth::auth_middleware);

    let upload_video = post(api::handlers::videos::upload_video)
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(auth());

    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/videos/:video_id/upload", upload_video.clone())
        .route("/api/video_upload/:video_id", upload_video)
        .route(
            "/api/videos",
            get(api::handlers::videos::list_videos)
                .post(api::handlers::videos::create_video)
                .layer(auth()),
        )
        .route(
            "/api/videos/:video_id",
            get(api::handlers::videos::get_video).layer(auth()),
        )
        .route(
            "/api/thumbnail_upload/:video_id",
            post(api::handlers::thumbnails::upload_thumbnail)
                .layer(DefaultBodyLimit::max(
                    state.config.max_thumbnail_size + 1024 * 1024, // multipart overhead
                ))
                .layer(auth()),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
