//! Token authority configuration

use jsonwebtoken::Algorithm;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Issuer stamped into every token
pub const ISSUER: &str = "serenity-api";

/// Audience stamped into every token
pub const AUDIENCE: &str = "serenity-client";

/// Default access token lifetime (24 hours)
pub const DEFAULT_ACCESS_TTL_SECONDS: i64 = 86_400;

/// Refresh token lifetime (30 days)
pub const REFRESH_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Longest access token lifetime; an access token never outlives a refresh token
pub const MAX_ACCESS_TTL_SECONDS: i64 = REFRESH_TTL_SECONDS;

/// Shortest secret accepted for HMAC signing
pub const MIN_SECRET_LEN: usize = 16;

const PLACEHOLDER_SECRETS: &[&str] = &[
    "secret",
    "changeme",
    "change-me",
    "your-secret-key",
    "your_jwt_secret_key_here",
    "temporary-secret-change-me-in-production",
];

/// Configuration for [`crate::TokenAuthority`]
///
/// Loaded once at process start and never mutated afterwards.
#[derive(Clone)]
pub struct AuthorityConfig {
    secret: Vec<u8>,
    algorithm: Algorithm,
    access_ttl_seconds: i64,
}

impl AuthorityConfig {
    /// HS256 with the default access TTL
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_access_ttl(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        REFRESH_TTL_SECONDS
    }

    /// Reject deployment mistakes: empty, short or placeholder secrets,
    /// non-HMAC algorithms and access TTLs outside `1..=MAX_ACCESS_TTL_SECONDS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let as_text = String::from_utf8_lossy(&self.secret);
        if PLACEHOLDER_SECRETS
            .iter()
            .any(|p| as_text.trim().eq_ignore_ascii_case(p))
        {
            return Err(ConfigError::PlaceholderSecret);
        }

        if self.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_LEN,
            });
        }

        if !is_hmac(self.algorithm) {
            return Err(ConfigError::UnsupportedAlgorithm(format!(
                "{:?}",
                self.algorithm
            )));
        }

        if self.access_ttl_seconds <= 0 || self.access_ttl_seconds > MAX_ACCESS_TTL_SECONDS {
            return Err(ConfigError::InvalidAccessTtl(self.access_ttl_seconds));
        }

        Ok(())
    }
}

impl fmt::Debug for AuthorityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorityConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .finish()
    }
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

/// Parse an algorithm name such as "HS256", accepting HMAC variants only
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(name.trim().to_ascii_uppercase().as_str())
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;

    if !is_hmac(algorithm) {
        return Err(ConfigError::UnsupportedAlgorithm(name.to_string()));
    }

    Ok(algorithm)
}
