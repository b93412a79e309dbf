//! HTTP Basic authentication helpers (RFC 7617)
//!
//! Used in both directions: the redirect service authenticates to the token
//! endpoint with client credentials, and the admin route checks inbound
//! `Authorization: Basic ...` headers against the configured accounts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Scheme prefix for the `Authorization` header value.
pub const SCHEME: &str = "Basic";

/// Base64 token for `user:password` (standard alphabet, padded).
pub fn encode_token(user: &str, password: &str) -> String {
    STANDARD.encode(format!("{user}:{password}"))
}

/// Full `Authorization` header value: `Basic <token>`.
pub fn header_value(user: &str, password: &str) -> String {
    format!("{SCHEME} {}", encode_token(user, password))
}

/// Decode an `Authorization` header value into `(user, password)`.
///
/// The scheme name is matched case-insensitively. Returns `None` for any
/// other scheme, invalid base64, non-UTF-8 content, or a payload without a
/// `:` separator. The password may itself contain `:`.
pub fn decode_header(value: &str) -> Option<(String, String)> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    let decoded = STANDARD.decode(token.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}

/// Compare two byte strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
