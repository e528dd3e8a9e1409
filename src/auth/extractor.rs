//! Bearer credential extraction for inbound HTTP requests.

use std::fmt;

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

/// Scheme prefix accepted in the `Authorization` header. Case-sensitive.
pub const BEARER_PREFIX: &str = "Bearer ";

/// An opaque bearer token taken from a single inbound request.
///
/// Never empty, and always representable as an outbound header value. The
/// token is only reachable through [`Credential::expose`], and `Debug`
/// output is redacted so the value cannot end up in logs through `{:?}`
/// formatting of a surrounding struct.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    header: HeaderValue,
}

impl Credential {
    /// Wrap a raw token. Returns `None` for an empty string or a token that
    /// cannot be sent back out in an `Authorization` header.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            return None;
        }
        let mut header = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, token)).ok()?;
        header.set_sensitive(true);
        Some(Self { token, header })
    }

    /// Raw token, for building outbound `Authorization` headers only.
    pub fn expose(&self) -> &str {
        &self.token
    }

    /// The `Bearer <token>` header value presented to upstream APIs,
    /// flagged sensitive.
    pub fn bearer_header(&self) -> HeaderValue {
        self.header.clone()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Parse an `Authorization` header value into a credential.
///
/// Absent, empty, non-Bearer, and bare `"Bearer "` values all yield `None`.
/// None of these are errors here; a missing credential only fails once a
/// handler asks for an authenticated client.
pub fn extract_bearer(header: Option<&str>) -> Option<Credential> {
    let header = header?;
    if header.len() <= BEARER_PREFIX.len() {
        return None;
    }
    header.strip_prefix(BEARER_PREFIX).and_then(Credential::new)
}

/// Read the bearer credential from a request's headers.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    extract_bearer(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let cred = extract_bearer(Some("Bearer abc123")).unwrap();
        assert_eq!(cred.expose(), "abc123");
    }

    #[test]
    fn test_extract_keeps_remainder_verbatim() {
        let cred = extract_bearer(Some("Bearer  spaced token ")).unwrap();
        assert_eq!(cred.expose(), " spaced token ");
    }

    #[test]
    fn test_extract_missing_or_empty_header() {
        assert!(extract_bearer(None).is_none());
        assert!(extract_bearer(Some("")).is_none());
    }

    #[test]
    fn test_extract_bare_prefix() {
        assert!(extract_bearer(Some("Bearer ")).is_none());
        assert!(extract_bearer(Some("Bearer")).is_none());
    }

    #[test]
    fn test_extract_other_schemes() {
        assert!(extract_bearer(Some("Basic dXNlcjpwYXNz")).is_none());
        assert!(extract_bearer(Some("bearer abc123")).is_none());
        assert!(extract_bearer(Some("BEARER abc123")).is_none());
        assert!(extract_bearer(Some("token abc123")).is_none());
    }

    #[test]
    fn test_credential_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(credential_from_headers(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer ghp_xyz"));
        let cred = credential_from_headers(&headers).unwrap();
        assert_eq!(cred.expose(), "ghp_xyz");
    }

    #[test]
    fn test_credential_from_non_utf8_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert!(credential_from_headers(&headers).is_none());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("super-secret").unwrap();
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("super-secret"));
        assert_eq!(debug, "Credential(<redacted>)");
    }

    #[test]
    fn test_credential_rejects_empty() {
        assert!(Credential::new("").is_none());
    }

    #[test]
    fn test_credential_rejects_header_breaking_bytes() {
        assert!(Credential::new("abc\r\n123").is_none());
    }

    #[test]
    fn test_bearer_header() {
        let header = Credential::new("abc").unwrap().bearer_header();
        assert_eq!(header, "Bearer abc");
        assert!(header.is_sensitive());
    }
}
