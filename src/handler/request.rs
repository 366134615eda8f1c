//! Inbound request descriptor
//!
//! Only the parts of an HTTP request the delivery layer looks at: the path,
//! the two conditional headers and the body-only query flag.

use hyper::HeaderMap;
use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRequest {
    /// Path as received, still percent-encoded
    pub path: String,
    pub if_modified_since: Option<String>,
    pub if_none_match: Option<String>,
    /// Serve the asset's own content rather than the full asset
    pub body_only: bool,
}

impl AssetRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Build from the pieces of an HTTP request
    pub fn from_parts(path: &str, query: Option<&str>, headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path: path.to_string(),
            if_modified_since: header("if-modified-since"),
            if_none_match: header("if-none-match"),
            body_only: query.is_some_and(body_flag),
        }
    }

    #[must_use]
    pub fn with_if_modified_since(mut self, value: impl Into<String>) -> Self {
        self.if_modified_since = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_if_none_match(mut self, value: impl Into<String>) -> Self {
        self.if_none_match = Some(value.into());
        self
    }

    #[must_use]
    pub const fn with_body_only(mut self, body_only: bool) -> Self {
        self.body_only = body_only;
        self
    }

    /// Percent-decoded path; invalid UTF-8 is replaced, never rejected
    pub fn decoded_path(&self) -> String {
        percent_decode_str(&self.path)
            .decode_utf8_lossy()
            .into_owned()
    }

    /// Whether the decoded path climbs out of its directory
    pub fn is_traversal(&self) -> bool {
        self.decoded_path()
            .split(['/', '\\'])
            .any(|segment| segment == "..")
    }
}

/// `body=1`, `body=t` or `body=true` anywhere in the query string
pub fn body_flag(query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes())
        .any(|(key, value)| key == "body" && matches!(value.as_ref(), "1" | "t" | "true"))
}
