//! HTTP cache control module
//!
//! Conditional request negotiation against an asset snapshot, and the
//! `Cache-Control` policy for fingerprinted versus plain URLs.

use crate::asset::AssetSnapshot;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// One year, the longest `max-age` caches are expected to honour
pub const PERMANENT_MAX_AGE: u32 = 31_536_000;

/// `-<hex digest>` right before the final extension, e.g. `app-1f2e3d4c.js`
static FINGERPRINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([0-9a-f]{7,64})\.[^./]+$").expect("valid fingerprint regex"));

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Quoted `ETag` for a content digest
pub fn etag(digest: &str) -> String {
    format!("\"{digest}\"")
}

/// Whether the client already holds the current content
///
/// Either header matching is enough. Both comparisons are exact string
/// equality: an `If-Modified-Since` later than the asset's mtime does not
/// match, and `If-None-Match` lists or wildcards are not expanded.
pub fn not_modified(
    if_modified_since: Option<&str>,
    if_none_match: Option<&str>,
    snapshot: &AssetSnapshot,
) -> bool {
    let modified_match =
        if_modified_since.is_some_and(|since| since == http_date(snapshot.mtime()));
    let etag_match = if_none_match.is_some_and(|tag| tag == etag(snapshot.digest()));
    modified_match || etag_match
}

/// Fingerprint segment of a request path, if it carries one
pub fn path_fingerprint(path: &str) -> Option<&str> {
    FINGERPRINT
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Remove the fingerprint segment, `app-1f2e3d4c.js` -> `app.js`
pub fn strip_fingerprint(path: &str) -> String {
    match path_fingerprint(path) {
        Some(fingerprint) => {
            let marker = format!("-{fingerprint}.");
            match path.rfind(&marker) {
                Some(at) => format!("{}.{}", &path[..at], &path[at + marker.len()..]),
                None => path.to_string(),
            }
        }
        None => path.to_string(),
    }
}

/// Cache control policy for a delivered asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// URL is pinned to the content, cache forever
    Permanent,
    /// URL may serve different content later, revalidate every use
    Revalidate,
}

impl CachePolicy {
    /// Permanent only when the request path carries this asset's fingerprint
    pub fn for_request(path: &str, digest: &str) -> Self {
        match path_fingerprint(path) {
            Some(fingerprint) if digest.starts_with(fingerprint) => Self::Permanent,
            _ => Self::Revalidate,
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Permanent => format!("public, max-age={PERMANENT_MAX_AGE}"),
            Self::Revalidate => "public, must-revalidate".to_string(),
        }
    }
}
