//! Request authentication.
//!
//! Admin endpoints are gated by a shared API key compared in constant time.
//! Caller identity is resolved by the outer platform (session/Telegram
//! mapping, out of scope here) and arrives as the `X-Akari-User` header; a
//! missing or malformed header is Unauthorized.

use akari_core::{AkariError, UserId};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

pub const USER_HEADER: &str = "x-akari-user";
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Debug)]
pub struct ApiKeyConfig {
    /// If `None`, admin auth is disabled (insecure demo only).
    pub api_key: Option<String>,
}

pub fn admin_key_from_env() -> ApiKeyConfig {
    let api_key = std::env::var("AKARI_ADMIN_API_KEY")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    ApiKeyConfig { api_key }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

pub async fn require_api_key(
    State(config): State<ApiKeyConfig>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = config.api_key else {
        return Ok(next.run(req).await);
    };

    let supplied = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    if supplied.is_some_and(|s| constant_time_eq(s, expected.trim())) {
        return Ok(next.run(req).await);
    }

    // Do not leak whether the key was missing vs incorrect.
    Err(StatusCode::UNAUTHORIZED)
}

/// Resolve the caller identity from headers.
pub fn caller(headers: &HeaderMap) -> Result<UserId, AkariError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(UserId)
        .ok_or(AkariError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn constant_time_eq_behaves_correctly() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }

    #[test]
    fn caller_parses_numeric_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static(" 42 "));
        assert_eq!(caller(&headers).unwrap(), UserId(42));
    }

    #[test]
    fn caller_rejects_missing_or_malformed_header() {
        let headers = HeaderMap::new();
        assert!(matches!(caller(&headers), Err(AkariError::Unauthorized)));

        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("alice"));
        assert!(matches!(caller(&headers), Err(AkariError::Unauthorized)));
    }

    #[test]
    fn empty_env_key_disables_auth() {
        std::env::remove_var("AKARI_ADMIN_API_KEY");
        assert!(admin_key_from_env().api_key.is_none());
    }
}
