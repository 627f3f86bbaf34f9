use crate::AppState;
use crate::api::error::AppError;
use crate::utils::auth::{bearer_token, validate_jwt};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Validates the bearer token and exposes its `Claims` as a request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).map_err(|e| {
        tracing::debug!("Missing credential: {}", e);
        AppError::Unauthorized("Couldn't find JWT".to_string())
    })?;

    let claims = validate_jwt(token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected credential: {}", e);
        AppError::Unauthorized("Couldn't validate JWT".to_string())
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
