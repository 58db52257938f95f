//! Error types for token issuance and validation

use thiserror::Error;

use crate::claims::TokenKind;

/// Reasons a token operation can fail
///
/// Every validation variant is a per-request failure that the HTTP layer
/// answers with 401. None of them is fatal to the process.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input is not a three-segment token with a decodable header
    #[error("Malformed token")]
    MalformedToken,

    /// Signature does not match the recomputed value
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token header names a different algorithm than the one configured
    #[error("Algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch { expected: String, found: String },

    /// Current time is at or after the token's expiry
    #[error("Token expired")]
    Expired,

    /// Token kind does not match the requested operation
    #[error("Wrong token type: expected {expected}, found {found}")]
    WrongTokenType { expected: TokenKind, found: TokenKind },

    /// No Authorization header, or not a Bearer credential
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid token audience")]
    InvalidAudience,

    /// Subject identifier was empty at issuance
    #[error("Subject identifier must not be empty")]
    InvalidSubject,

    /// Issue time plus lifetime does not fit in a timestamp
    #[error("Token expiry is out of range")]
    ExpiryOverflow,

    /// Encoding or signing failed while minting a token
    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::AlgorithmMismatch { .. } => "ALGORITHM_MISMATCH",
            AuthError::Expired => "TOKEN_EXPIRED",
            AuthError::WrongTokenType { .. } => "WRONG_TOKEN_TYPE",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidIssuer => "INVALID_ISSUER",
            AuthError::InvalidAudience => "INVALID_AUDIENCE",
            AuthError::InvalidSubject => "INVALID_SUBJECT",
            AuthError::ExpiryOverflow => "EXPIRY_OVERFLOW",
            AuthError::Signing(_) => "SIGNING_FAILED",
        }
    }

    /// Whether the failure is the caller's fault (401) rather than ours (500)
    pub fn is_unauthorized(&self) -> bool {
        !matches!(
            self,
            AuthError::Signing(_) | AuthError::InvalidSubject | AuthError::ExpiryOverflow
        )
    }
}

/// Configuration errors raised when building a [`crate::TokenAuthority`]
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Signing secret must be at least {min} bytes")]
    SecretTooShort { min: usize },

    #[error("Signing secret is a placeholder value and must be replaced")]
    PlaceholderSecret,

    #[error("Unsupported signing algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("Access token TTL must be between 1 second and 30 days, got {0}")]
    InvalidAccessTtl(i64),
}
