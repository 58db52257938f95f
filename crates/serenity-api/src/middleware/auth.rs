//! Bearer Authentication Middleware
//!
//! Guards protected API endpoints. Extracts the access token from the
//! `Authorization: Bearer <token>` header, validates it with the shared
//! [`TokenAuthority`], and makes the caller's identity available to handlers
//! via Axum's Extension.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serenity_auth::{Claims, TokenAuthority};
use std::sync::Arc;
use tracing::debug;

use crate::models::ErrorResponse;
use crate::AppState;

/// Authenticated caller extracted from an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Subject id, used downstream as the ownership key
    pub subject_id: String,
    /// Full validated payload of the access token
    pub claims: Claims,
}

/// Authentication middleware that only admits valid access tokens
///
/// # Errors
/// Returns 401 Unauthorized with a machine-readable code when:
/// - The Authorization header is missing or not a Bearer credential
/// - The token is malformed, badly signed, or uses another algorithm
/// - The token is expired
/// - The token is a refresh token
pub async fn require_access(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let claims = authorize(&state.authority, auth_header)?;

    let auth_user = AuthUser {
        subject_id: claims.sub.clone(),
        claims,
    };

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn authorize(
    authority: &TokenAuthority,
    auth_header: Option<&str>,
) -> Result<Claims, (StatusCode, Json<ErrorResponse>)> {
    authority.authorize(auth_header).map_err(|e| {
        debug!("Rejected request: {}", e);
        ErrorResponse::from_auth_error(&e)
    })
}
