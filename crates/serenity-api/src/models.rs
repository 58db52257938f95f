use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serenity_auth::{AuthError, ExtraClaims, TokenPair};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Translate an authentication failure into a status and body
    ///
    /// Validation failures are 401; signing failures are 500 with a generic
    /// message so no internal detail leaks.
    pub fn from_auth_error(err: &AuthError) -> (StatusCode, Json<ErrorResponse>) {
        let (status, message) = if err.is_unauthorized() {
            (StatusCode::UNAUTHORIZED, err.to_string())
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to issue token".to_string(),
            )
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: Some(err.code().to_string()),
            }),
        )
    }
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token from the last issued pair
    pub refresh_token: String,
}

/// Issued token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    /// Access token for the Authorization header
    pub access_token: String,
    /// Refresh token; replaces the one the client held before
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Always "Bearer"
    pub token_type: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
            token_type: pair.token_type,
        }
    }
}

/// Identity behind the presented access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    /// Authenticated subject id
    pub subject_id: String,
    /// Token kind (always "access" here)
    pub token_type: String,
    /// Issued at (unix seconds)
    pub issued_at: i64,
    /// Expires at (unix seconds)
    pub expires_at: i64,
    /// Seconds before the access token expires
    pub remaining_seconds: i64,
    /// Extra claims embedded at issuance
    #[schema(value_type = Object)]
    pub claims: BTreeMap<String, serde_json::Value>,
}

/// Render extra claims as plain JSON values
pub fn claims_to_json(extra: &ExtraClaims) -> BTreeMap<String, serde_json::Value> {
    extra
        .iter()
        .map(|(key, value)| {
            let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
            (key.clone(), json)
        })
        .collect()
}
