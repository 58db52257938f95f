//! Stateless issuance and verification of bearer tokens

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{crypto, encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::claims::{ClaimValue, Claims, ExtraClaims, TokenKind, TokenPair, RESERVED_CLAIMS};
use crate::clock::{Clock, SystemClock};
use crate::config::{AuthorityConfig, AUDIENCE, ISSUER, REFRESH_TTL_SECONDS};
use crate::error::{AuthError, ConfigError};
use crate::header::extract_from_header;

/// Only the part of the JOSE header we act on
#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Mints and verifies access/refresh tokens
///
/// Holds no mutable state: the secret, algorithm and TTLs are fixed at
/// construction, so one instance can be shared across any number of request
/// handlers behind an `Arc`.
pub struct TokenAuthority {
    config: AuthorityConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenAuthority {
    /// Create an authority backed by the system clock
    pub fn new(config: AuthorityConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an authority with an explicit time source
    pub fn with_clock(config: AuthorityConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret()),
            decoding_key: DecodingKey::from_secret(config.secret()),
            config,
            clock,
        })
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Current time according to the authority's clock
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Issue an access token
    ///
    /// Extra claims are merged into the payload, except for reserved names
    /// (`sub`, `exp`, `iat`, `iss`, `aud`, `type`, ...) which always keep the
    /// authority's values.
    pub fn issue(
        &self,
        subject_id: &str,
        extra_claims: Option<&ExtraClaims>,
    ) -> Result<String, AuthError> {
        let extra = extra_claims.map(sanitize_extra_claims).unwrap_or_default();
        self.mint(
            subject_id,
            TokenKind::Access,
            self.config.access_ttl_seconds(),
            extra,
        )
    }

    /// Issue a refresh token; refresh tokens never carry extra claims
    pub fn issue_refresh(&self, subject_id: &str) -> Result<String, AuthError> {
        self.mint(
            subject_id,
            TokenKind::Refresh,
            REFRESH_TTL_SECONDS,
            ExtraClaims::new(),
        )
    }

    /// Issue an access/refresh pair for a freshly authenticated subject
    pub fn issue_pair(
        &self,
        subject_id: &str,
        extra_claims: Option<&ExtraClaims>,
    ) -> Result<TokenPair, AuthError> {
        let access_token = self.issue(subject_id, extra_claims)?;
        let refresh_token = self.issue_refresh(subject_id)?;

        info!("Issued token pair for subject {}", subject_id);

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_ttl_seconds(),
        ))
    }

    fn mint(
        &self,
        subject_id: &str,
        kind: TokenKind,
        ttl_seconds: i64,
        extra: ExtraClaims,
    ) -> Result<String, AuthError> {
        if subject_id.trim().is_empty() {
            return Err(AuthError::InvalidSubject);
        }

        let now = self.clock.now();
        let exp = now
            .checked_add(ttl_seconds)
            .ok_or(AuthError::ExpiryOverflow)?;
        let claims = Claims {
            sub: subject_id.to_string(),
            iat: now,
            exp,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            jti: Uuid::new_v4().to_string(),
            kind,
            extra,
        };

        let header = Header::new(self.config.algorithm());
        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Verify a token and return its claims
    ///
    /// Checks run in order and stop at the first failure: structure,
    /// signature, algorithm, expiry, then issuer and audience.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut segments = token.split('.');
        let (header_segment, payload_segment, signature) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
                (h, p, s)
            }
            _ => {
                debug!("Token rejected: expected three segments");
                return Err(AuthError::MalformedToken);
            }
        };

        let header: TokenHeader = decode_segment(header_segment).ok_or_else(|| {
            debug!("Token rejected: undecodable header");
            AuthError::MalformedToken
        })?;

        // Signed message is everything before the last dot
        let message = &token[..header_segment.len() + 1 + payload_segment.len()];
        let verified = crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding_key,
            self.config.algorithm(),
        )
        .unwrap_or(false);
        if !verified {
            debug!("Token rejected: signature mismatch");
            return Err(AuthError::InvalidSignature);
        }

        let expected = algorithm_name(self.config.algorithm());
        if header.alg != expected {
            debug!(
                "Token rejected: algorithm {} does not match {}",
                header.alg, expected
            );
            return Err(AuthError::AlgorithmMismatch {
                expected,
                found: header.alg,
            });
        }

        let claims: Claims = decode_segment(payload_segment).ok_or_else(|| {
            debug!("Token rejected: undecodable payload");
            AuthError::MalformedToken
        })?;

        if claims.is_expired_at(self.clock.now()) {
            debug!("Token rejected: expired at {}", claims.exp);
            return Err(AuthError::Expired);
        }

        if claims.iss != ISSUER {
            debug!("Token rejected: issuer {}", claims.iss);
            return Err(AuthError::InvalidIssuer);
        }

        if claims.aud != AUDIENCE {
            debug!("Token rejected: audience {}", claims.aud);
            return Err(AuthError::InvalidAudience);
        }

        Ok(claims)
    }

    /// Rotate a refresh token into a brand-new pair
    ///
    /// The presented refresh token is not revoked; it stays usable until its
    /// own expiry.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate(refresh_token)?;

        if claims.kind != TokenKind::Refresh {
            debug!("Refresh rejected: got {} token", claims.kind);
            return Err(AuthError::WrongTokenType {
                expected: TokenKind::Refresh,
                found: claims.kind,
            });
        }

        self.issue_pair(&claims.sub, None)
    }

    /// Guard for protected routes: extract, validate and require an access token
    pub fn authorize(&self, authorization_header: Option<&str>) -> Result<Claims, AuthError> {
        let token = extract_from_header(authorization_header).ok_or(AuthError::MissingToken)?;
        let claims = self.validate(token)?;

        if !self.is_access_token(&claims) {
            return Err(AuthError::WrongTokenType {
                expected: TokenKind::Access,
                found: claims.kind,
            });
        }

        Ok(claims)
    }

    pub fn is_access_token(&self, claims: &Claims) -> bool {
        claims.is_access()
    }

    pub fn is_expired(&self, claims: &Claims) -> bool {
        claims.is_expired_at(self.clock.now())
    }

    /// Seconds left before expiry, never negative
    pub fn remaining_seconds(&self, claims: &Claims) -> i64 {
        claims.remaining_seconds_at(self.clock.now())
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn algorithm_name(algorithm: Algorithm) -> String {
    format!("{:?}", algorithm)
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn sanitize_extra_claims(extra: &ExtraClaims) -> ExtraClaims {
    extra
        .iter()
        .filter(|(key, value)| {
            if RESERVED_CLAIMS.contains(&key.as_str()) {
                debug!("Dropping reserved claim '{}' from extra claims", key);
                return false;
            }
            if let ClaimValue::Float(f) = value {
                if !f.is_finite() {
                    debug!("Dropping non-finite claim '{}'", key);
                    return false;
                }
            }
            true
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
