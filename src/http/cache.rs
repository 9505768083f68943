//! HTTP cache control module
//!
//! Provides the cache directives used for assets and pages, `ETag`
//! generation and conditional request matching.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Versioned static assets never change under the same URL
pub const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Pages are revalidated on every visit
pub const REVALIDATE: &str = "public, max-age=0, must-revalidate";

/// Generate `ETag` using fast hashing
///
/// Returns a quoted tag, e.g. `"abc123def"`.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Accepts a single tag, a comma separated list, or `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .map(str::trim)
            .any(|e| e == etag || e == "*" || e.strip_prefix("W/") == Some(etag))
    })
}
