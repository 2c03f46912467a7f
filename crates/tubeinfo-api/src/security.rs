//! Shared-secret authentication.
//!
//! Every route except `/health`, `/debug/*` and CORS preflight requires the
//! `x-api-key` header to match `API_KEY`. An unset key rejects everything.

use axum::http::Method;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Prefix of the diagnostics routes.
pub const DEBUG_PATH_PREFIX: &str = "/debug";

/// Paths reachable without a key.
const PUBLIC_PATHS: &[&str] = &["/health"];

/// Whether a request skips the API key check.
pub fn is_auth_exempt(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS {
        return true;
    }
    if PUBLIC_PATHS.contains(&path) {
        return true;
    }
    path == DEBUG_PATH_PREFIX || path.starts_with("/debug/")
}

/// Compare the provided key with the configured one.
///
/// Returns false when either side is missing.
pub fn verify_api_key(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() => {
            constant_time_eq(expected.as_bytes(), provided.as_bytes())
        }
        _ => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
