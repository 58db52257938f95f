//! Bearer credential extraction (RFC 6750)
//!
//! ```text
//! Authorization: Bearer <token>
//! ```

const BEARER_PREFIX: &str = "bearer ";

/// Extract the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively. Returns `None` for an absent or
/// empty header, any other scheme, or an empty token.
///
/// # Example
/// ```
/// use serenity_auth::extract_from_header;
///
/// assert_eq!(extract_from_header(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
/// assert_eq!(extract_from_header(Some("Basic xyz")), None);
/// assert_eq!(extract_from_header(None), None);
/// ```
pub fn extract_from_header(header_value: Option<&str>) -> Option<&str> {
    let value = header_value?.trim_start();

    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = value[BEARER_PREFIX.len()..].trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token)
}
