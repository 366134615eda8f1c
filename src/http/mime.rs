//! MIME type detection module
//!
//! Content types for build artifacts, chosen by file extension. Works on a
//! request path alone, so error rendering can pick a format even when no
//! asset was resolved.

use std::path::Path;

pub const JAVASCRIPT: &str = "application/javascript";
pub const CSS: &str = "text/css";

/// Content type for a request path or logical path
///
/// # Examples
/// ```
/// use assetd::http::mime::content_type_of;
/// assert_eq!(content_type_of("/assets/app-1a2b3c4d.js"), "application/javascript");
/// assert_eq!(content_type_of("theme.css"), "text/css");
/// assert_eq!(content_type_of("LICENSE"), "application/octet-stream");
/// ```
pub fn content_type_of(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    content_type_for_extension(extension.as_deref())
}

/// Content type for a bare extension (without the dot)
pub fn content_type_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        // Scripts and styles
        Some("js" | "mjs" | "cjs") => JAVASCRIPT,
        Some("css") => CSS,
        Some("map" | "json") => "application/json",
        Some("wasm") => "application/wasm",

        // Documents
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_types() {
        assert_eq!(content_type_of("app.js"), JAVASCRIPT);
        assert_eq!(content_type_of("/assets/app.mjs"), JAVASCRIPT);
        assert_eq!(content_type_of("css/site.css"), CSS);
        assert_eq!(content_type_of("app.js.map"), "application/json");
        assert_eq!(content_type_of("font.woff2"), "font/woff2");
    }

    #[test]
    fn test_extension_case_is_ignored() {
        assert_eq!(content_type_of("APP.JS"), JAVASCRIPT);
        assert_eq!(content_type_of("Site.Css"), CSS);
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_of("archive.xyz"), "application/octet-stream");
        assert_eq!(content_type_of("Makefile"), "application/octet-stream");
        assert_eq!(content_type_for_extension(None), "application/octet-stream");
    }
}
