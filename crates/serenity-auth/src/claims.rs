//! Token claims and the issuance response shape

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Claim names owned by the authority; callers can never set these
pub const RESERVED_CLAIMS: &[&str] = &["sub", "iat", "exp", "nbf", "iss", "aud", "jti", "type"];

/// Caller-supplied claims merged into an access token
pub type ExtraClaims = BTreeMap<String, ClaimValue>;

/// Which operation a token authorizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential for API calls
    Access,
    /// Long-lived credential that only mints new pairs
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Primitive value of an extra claim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::String(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Integer(value)
    }
}

impl From<f64> for ClaimValue {
    fn from(value: f64) -> Self {
        ClaimValue::Float(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        ClaimValue::Bool(value)
    }
}

/// Parses the most specific primitive: bool, then integer, then float,
/// falling back to a plain string.
impl FromStr for ClaimValue {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(b) = s.parse::<bool>() {
            return Ok(ClaimValue::Bool(b));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(ClaimValue::Integer(i));
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Ok(ClaimValue::Float(f));
            }
        }
        Ok(ClaimValue::String(s.to_string()))
    }
}

/// Decoded token payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (authenticated principal id)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Unique token id, so two tokens minted in the same second still differ
    pub jti: String,
    /// Access or refresh
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Any additional caller claims
    #[serde(flatten)]
    pub extra: ExtraClaims,
}

impl Claims {
    pub fn subject_id(&self) -> &str {
        &self.sub
    }

    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }

    /// A token is expired from the second of `exp` onwards
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Seconds until expiry, clamped at zero
    pub fn remaining_seconds_at(&self, now: i64) -> i64 {
        self.exp.saturating_sub(now).max(0)
    }

    pub fn extra_claim(&self, key: &str) -> Option<&ClaimValue> {
        self.extra.get(key)
    }
}

/// Issued access/refresh pair, serialized as the login and refresh response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Always "Bearer"
    pub token_type: String,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims {
            sub: "user_42".to_string(),
            iat: 1_000,
            exp: 1_010,
            iss: "serenity-api".to_string(),
            aud: "serenity-client".to_string(),
            jti: "id-1".to_string(),
            kind: TokenKind::Access,
            extra: ExtraClaims::new(),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = sample_claims();
        assert!(!claims.is_expired_at(1_009));
        assert!(claims.is_expired_at(1_010));
        assert!(claims.is_expired_at(1_011));
    }

    #[test]
    fn test_remaining_seconds_clamped() {
        let claims = sample_claims();
        assert_eq!(claims.remaining_seconds_at(1_000), 10);
        assert_eq!(claims.remaining_seconds_at(1_010), 0);
        assert_eq!(claims.remaining_seconds_at(5_000), 0);
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["type"], "access");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_extra_claims_flatten_into_payload() {
        let mut claims = sample_claims();
        claims.extra.insert("role".to_string(), "admin".into());
        claims.extra.insert("team_id".to_string(), 7i64.into());

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["team_id"], 7);

        let decoded: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.extra_claim("role"), Some(&ClaimValue::from("admin")));
        assert_eq!(decoded.extra_claim("team_id"), Some(&ClaimValue::Integer(7)));
    }

    #[test]
    fn test_claim_value_parsing() {
        assert_eq!("true".parse::<ClaimValue>().unwrap(), ClaimValue::Bool(true));
        assert_eq!("42".parse::<ClaimValue>().unwrap(), ClaimValue::Integer(42));
        assert_eq!("1.5".parse::<ClaimValue>().unwrap(), ClaimValue::Float(1.5));
        assert_eq!(
            "admin".parse::<ClaimValue>().unwrap(),
            ClaimValue::String("admin".to_string())
        );
        assert_eq!(
            "NaN".parse::<ClaimValue>().unwrap(),
            ClaimValue::String("NaN".to_string())
        );
    }

    #[test]
    fn test_pair_token_type() {
        let pair = TokenPair::new("a".to_string(), "r".to_string(), 60);
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 60);
    }
}
