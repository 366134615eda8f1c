//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, mount-prefix
//! matching, and dispatch to the asset handler.

use super::assets;
use super::request::AssetRequest;
use crate::config::AppState;
use crate::http::{self, AssetBody};
use crate::logger;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<AssetBody>, Infallible> {
    let method = req.method().clone();
    let is_head = method == Method::HEAD;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&method) {
        return Ok(resp);
    }

    // 2. Traversal is refused before the mount decides whose path it is
    let path = req.uri().path();
    if AssetRequest::new(path).is_traversal() {
        logger::log_warning(&format!("Path traversal attempt blocked: {path}"));
        return Ok(http::build_403_response());
    }

    // 3. Paths outside the mount are somebody else's
    let Some(relative) = strip_mount(path, &state.prefix) else {
        return Ok(http::build_404_response());
    };

    let request = AssetRequest::from_parts(&relative, req.uri().query(), req.headers());

    // 4. Resolve and build the response; file reads block, keep them off the reactor
    let environment = Arc::clone(&state.environment);
    let result =
        tokio::task::spawn_blocking(move || assets::call(environment.as_ref(), &request)).await;

    let response = match result {
        Ok(Ok(response)) => response.map(AssetBody::offload),
        Ok(Err(e)) => {
            logger::log_error(&format!("Unhandled asset failure: {}: {e}", e.kind()));
            http::build_500_response()
        }
        Err(e) => {
            logger::log_error(&format!("Asset task failed: {e}"));
            http::build_500_response()
        }
    };

    Ok(if is_head { strip_body(response) } else { response })
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<AssetBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Path relative to the mount prefix, keeping its leading slash
fn strip_mount(path: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return Some(path.to_string());
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

/// HEAD answers carry the GET headers and no body
fn strip_body(response: Response<AssetBody>) -> Response<AssetBody> {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, AssetBody::empty())
}
