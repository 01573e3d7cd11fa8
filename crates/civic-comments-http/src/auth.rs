// crates/civic-comments-http/src/auth.rs
// ============================================================================
// Module: Session Extraction
// Description: Session token extraction from bearer headers and cookies.
// Purpose: Identify the viewer credential on each request without trusting it.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! A viewer authenticates with `Authorization: Bearer <token>` or with the
//! configured session cookie. The bearer header wins when both are present.
//! Tokens are only extracted here; resolution happens against the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::header::COOKIE;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of the authorization header and of the session cookie value.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Header exceeded the size limit.
    #[error("authorization header too large")]
    TooLarge,
    /// Header present but malformed.
    #[error("invalid authorization header")]
    Malformed,
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Returns the session token presented with the request, if any.
///
/// # Errors
///
/// Returns [`AuthError`] when a credential header is oversized or malformed.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Result<Option<String>, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let header = value.to_str().map_err(|_| AuthError::Malformed)?;
        return parse_bearer_token(header).map(Some);
    }
    for value in headers.get_all(COOKIE) {
        let Ok(header) = value.to_str() else {
            continue;
        };
        if let Some(token) = cookie_value(header, cookie_name) {
            if token.len() > MAX_AUTH_HEADER_BYTES {
                return Err(AuthError::TooLarge);
            }
            return Ok(Some(token.to_string()));
        }
    }
    Ok(None)
}

/// Parses a bearer authorization header.
fn parse_bearer_token(header: &str) -> Result<String, AuthError> {
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::TooLarge);
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(token.to_string())
}

/// Finds a cookie by name in a `Cookie` header value.
pub(crate) fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_header_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("civic_session=from-cookie"));
        assert_eq!(session_token(&headers, "civic_session"), Ok(Some("from-header".to_string())));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; civic_session=abc; lang=ca"));
        assert_eq!(session_token(&headers, "civic_session"), Ok(Some("abc".to_string())));
        assert_eq!(session_token(&headers, "other"), Ok(None));
    }

    #[test]
    fn malformed_bearer_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(session_token(&headers, "civic_session"), Err(AuthError::Malformed));
    }

    #[test]
    fn unrelated_large_cookies_do_not_block_anonymous_access() {
        let mut headers = HeaderMap::new();
        let value = format!("analytics={}", "a".repeat(MAX_AUTH_HEADER_BYTES + 1));
        headers.insert(COOKIE, HeaderValue::from_str(&value).unwrap());
        assert_eq!(session_token(&headers, "civic_session"), Ok(None));
    }

    #[test]
    fn oversized_session_cookie_is_rejected() {
        let mut headers = HeaderMap::new();
        let value = format!("civic_session={}", "a".repeat(MAX_AUTH_HEADER_BYTES + 1));
        headers.insert(COOKIE, HeaderValue::from_str(&value).unwrap());
        assert_eq!(session_token(&headers, "civic_session"), Err(AuthError::TooLarge));
    }

    #[test]
    fn oversized_bearer_is_rejected() {
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", "a".repeat(MAX_AUTH_HEADER_BYTES));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        assert_eq!(session_token(&headers, "civic_session"), Err(AuthError::TooLarge));
    }
}
