//! Bearer token authentication for Serenity
//!
//! A [`TokenAuthority`] mints short-lived access tokens and long-lived refresh
//! tokens (HMAC-signed JWTs), verifies them on every protected request, and
//! rotates a refresh token into a brand-new pair. It keeps no session state:
//! a token stays valid until its expiry and there is no revocation list.
//!
//! # Usage
//!
//! ```
//! use serenity_auth::{AuthorityConfig, TokenAuthority};
//!
//! let authority = TokenAuthority::new(
//!     AuthorityConfig::new("an-example-secret-of-decent-length").with_access_ttl(900),
//! )
//! .unwrap();
//!
//! let pair = authority.issue_pair("user_42", None).unwrap();
//! let claims = authority
//!     .authorize(Some(&format!("Bearer {}", pair.access_token)))
//!     .unwrap();
//! assert_eq!(claims.subject_id(), "user_42");
//! ```

pub mod authority;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod header;

pub use authority::TokenAuthority;
pub use claims::{ClaimValue, Claims, ExtraClaims, TokenKind, TokenPair, RESERVED_CLAIMS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    parse_algorithm, AuthorityConfig, AUDIENCE, DEFAULT_ACCESS_TTL_SECONDS, ISSUER,
    MAX_ACCESS_TTL_SECONDS, REFRESH_TTL_SECONDS,
};
pub use error::{AuthError, ConfigError};
pub use header::extract_from_header;

// Re-export useful types
pub use jsonwebtoken::Algorithm;
