//! HTTP response building module
//!
//! Builders for every status the delivery layer produces, plus the few the
//! hosting server adds around it.

use super::body::AssetBody;
use super::cache::{etag, http_date, CachePolicy};
use crate::asset::AssetSnapshot;
use hyper::Response;

/// Header telling an enclosing server it may try another handler
pub const CASCADE_HEADER: &str = "X-Cascade";

/// Build 200 OK response for a resolved asset
///
/// `length` is the byte length of `body`: the snapshot length for the full
/// asset, or the raw content length for body-only requests.
pub fn build_asset_response(
    snapshot: &AssetSnapshot,
    length: u64,
    policy: CachePolicy,
    body: AssetBody,
) -> Response<AssetBody> {
    Response::builder()
        .status(200)
        .header("Content-Type", snapshot.content_type())
        .header("Content-Length", length)
        .header("Cache-Control", policy.to_header_value())
        .header("Last-Modified", http_date(snapshot.mtime()))
        .header("ETag", etag(snapshot.digest()))
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(AssetBody::empty())
        })
}

/// Build 304 Not Modified response, deliberately without headers
pub fn build_304_response() -> Response<AssetBody> {
    Response::builder()
        .status(304)
        .body(AssetBody::empty())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(AssetBody::empty())
        })
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<AssetBody> {
    build_plain_response(403, None, "Forbidden")
}

/// Build 404 Not Found response carrying the cascade hint
pub fn build_404_response() -> Response<AssetBody> {
    build_plain_response(404, Some((CASCADE_HEADER, "pass")), "Not found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<AssetBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Content-Length", 18)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(AssetBody::from("Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(AssetBody::from("Method Not Allowed"))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<AssetBody> {
    Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(AssetBody::empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(AssetBody::empty())
        })
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<AssetBody> {
    build_plain_response(500, None, "Internal Server Error")
}

/// Build an in-band rendered body, always status 200
pub fn build_rendered_response(content_type: &str, body: String) -> Response<AssetBody> {
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", body.len())
        .body(AssetBody::from(body))
        .unwrap_or_else(|e| {
            log_build_error("rendered error", &e);
            Response::new(AssetBody::empty())
        })
}

fn build_plain_response(
    status: u16,
    extra: Option<(&str, &str)>,
    text: &'static str,
) -> Response<AssetBody> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", text.len());

    if let Some((name, value)) = extra {
        builder = builder.header(name, value);
    }

    builder.body(AssetBody::from(text)).unwrap_or_else(|e| {
        log_build_error(&status.to_string(), &e);
        Response::new(AssetBody::from(text))
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(response: &'a Response<AssetBody>, name: &str) -> &'a str {
        response.headers().get(name).unwrap().to_str().unwrap()
    }

    #[test]
    fn test_404_response() {
        let response = build_404_response();
        assert_eq!(response.status(), 404);
        assert_eq!(header(&response, "Content-Length"), "9");
        assert_eq!(header(&response, "X-Cascade"), "pass");
        let body = response.into_body().collect_bytes().unwrap();
        assert_eq!(&body[..], b"Not found");
    }

    #[test]
    fn test_403_response() {
        let response = build_403_response();
        assert_eq!(response.status(), 403);
        assert_eq!(header(&response, "Content-Length"), "9");
        assert!(response.headers().get("X-Cascade").is_none());
    }

    #[test]
    fn test_304_has_no_headers() {
        let response = build_304_response();
        assert_eq!(response.status(), 304);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_rendered_response_length_is_bytes() {
        let response = build_rendered_response("text/css", "é".to_string());
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "Content-Length"), "2");
    }
}
