use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serenity_auth::AuthError;
use std::sync::Arc;
use tracing::{info, warn};

use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Exchange a refresh token for a new token pair
///
/// The response carries a new refresh token as well; the client must store it
/// in place of the one it sent. A body without a usable `refresh_token` is
/// answered like a request without credentials.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenPairResponse),
        (status = 401, description = "Refresh token rejected", body = ErrorResponse),
        (status = 500, description = "Token signing failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Token refresh rejected: {}", rejection.body_text());
        ErrorResponse::from_auth_error(&AuthError::MissingToken)
    })?;

    let pair = state.authority.refresh(&req.refresh_token).map_err(|e| {
        warn!("Token refresh rejected: {}", e);
        ErrorResponse::from_auth_error(&e)
    })?;

    info!("Token pair rotated");

    Ok(Json(pair.into()))
}

/// Get the identity behind the presented access token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated identity", body = CurrentUserResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<CurrentUserResponse> {
    let remaining_seconds = state.authority.remaining_seconds(&user.claims);

    Json(CurrentUserResponse {
        subject_id: user.subject_id,
        token_type: user.claims.kind.to_string(),
        issued_at: user.claims.iat,
        expires_at: user.claims.exp,
        remaining_seconds,
        claims: claims_to_json(&user.claims.extra),
    })
}
