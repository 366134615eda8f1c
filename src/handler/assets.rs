//! Asset request handling
//!
//! The decision sequence from an inbound request to a response:
//!
//! 1. Reject traversal in the decoded path (403, the resolver is not called)
//! 2. Resolve the logical path (404 with a cascade hint when nothing matches)
//! 3. Answer 304 when the client's conditional headers match exactly
//! 4. Deliver the asset with content, length and cache headers
//!
//! A failure in steps 2-4 is rendered in-band for scripts and stylesheets
//! and returned to the caller for anything else. Every outcome is logged with
//! its elapsed time.

use super::error_page::ErrorRendering;
use super::request::AssetRequest;
use crate::asset::{AssetError, Resolver};
use crate::http::cache::{self, CachePolicy};
use crate::http::{self, AssetBody};
use crate::logger;
use hyper::Response;
use std::time::Instant;

/// How a request ended, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotModified,
    Forbidden,
    NotFound,
    /// Failure rendered into a script or stylesheet body
    ErrorRendered,
    /// Failure returned to the caller
    Failed,
}

impl Outcome {
    pub const fn status(self) -> u16 {
        match self {
            Self::Ok | Self::ErrorRendered => 200,
            Self::NotModified => 304,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Failed => 500,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "200 OK",
            Self::NotModified => "304 Not Modified",
            Self::Forbidden => "403 Forbidden",
            Self::NotFound => "404 Not Found",
            Self::ErrorRendered => "200 Error Rendered",
            Self::Failed => "500 Internal Server Error",
        }
    }
}

/// Handle one asset request
///
/// Synchronous and stateless: all state lives in `resolver`. An `Err` is a
/// failure this layer could not render and is returned unchanged.
pub fn call<R: Resolver + ?Sized>(
    resolver: &R,
    request: &AssetRequest,
) -> Result<Response<AssetBody>, AssetError> {
    let start = Instant::now();
    let result = respond(resolver, request);

    let outcome = match &result {
        Ok((outcome, _)) => *outcome,
        Err(_) => Outcome::Failed,
    };
    logger::log_served(
        &request.path,
        outcome.status(),
        outcome.label(),
        start.elapsed(),
    );

    result.map(|(_, response)| response)
}

fn respond<R: Resolver + ?Sized>(
    resolver: &R,
    request: &AssetRequest,
) -> Result<(Outcome, Response<AssetBody>), AssetError> {
    if request.is_traversal() {
        logger::log_warning(&format!("Path traversal attempt blocked: {}", request.path));
        return Ok((Outcome::Forbidden, http::build_403_response()));
    }

    match deliver(resolver, request) {
        Ok(done) => Ok(done),
        Err(error) => {
            let path = request.decoded_path();
            let rendering = ErrorRendering::for_content_type(resolver.content_type_of(&path));
            logger::log_error(&format!(
                "Failed to serve asset {path}: {}: {error}",
                error.kind()
            ));

            if rendering != ErrorRendering::Unhandled {
                // The next request should recompile, not reuse this failure
                resolver.expire_index();
            }
            rendering
                .render(error, &path)
                .map(|response| (Outcome::ErrorRendered, response))
        }
    }
}

fn deliver<R: Resolver + ?Sized>(
    resolver: &R,
    request: &AssetRequest,
) -> Result<(Outcome, Response<AssetBody>), AssetError> {
    let path = request.decoded_path();
    let logical_path = cache::strip_fingerprint(path.trim_start_matches('/'));

    let Some(snapshot) = resolver.find_asset(&logical_path)? else {
        return Ok((Outcome::NotFound, http::build_404_response()));
    };

    if cache::not_modified(
        request.if_modified_since.as_deref(),
        request.if_none_match.as_deref(),
        &snapshot,
    ) {
        return Ok((Outcome::NotModified, http::build_304_response()));
    }

    let policy = CachePolicy::for_request(&path, snapshot.digest());
    let response = if request.body_only {
        let source = snapshot.source()?;
        let length = u64::try_from(source.len()).unwrap_or(u64::MAX);
        http::build_asset_response(&snapshot, length, policy, AssetBody::Full(source))
    } else {
        let chunks = snapshot.chunks()?;
        http::build_asset_response(
            &snapshot,
            snapshot.length(),
            policy,
            AssetBody::Chunks(chunks),
        )
    };

    Ok((Outcome::Ok, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetSnapshot, Environment, FileEnvironment, FileStat};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Resolver that fails every lookup and counts calls
    struct FailingResolver {
        lookups: Cell<usize>,
        expired: Cell<usize>,
    }

    impl FailingResolver {
        const fn new() -> Self {
            Self {
                lookups: Cell::new(0),
                expired: Cell::new(0),
            }
        }
    }

    impl Environment for FailingResolver {
        fn digest(&self) -> String {
            "e1".to_string()
        }

        fn stat(&self, _path: &Path) -> Option<FileStat> {
            None
        }

        fn file_digest(&self, path: &Path) -> Result<String, AssetError> {
            Err(AssetError::read(path, std::io::Error::other("unreadable")))
        }
    }

    impl Resolver for FailingResolver {
        fn find_asset(&self, logical_path: &str) -> Result<Option<AssetSnapshot>, AssetError> {
            self.lookups.set(self.lookups.get() + 1);
            Err(AssetError::Compile {
                path: PathBuf::from(logical_path),
                message: "Undefined variable \"$brand\"".to_string(),
                location: Some(format!("{logical_path}:4")),
            })
        }

        fn expire_index(&self) {
            self.expired.set(self.expired.get() + 1);
        }
    }

    /// Resolver whose snapshots point at files deleted after resolution
    struct VanishedResolver {
        snapshots: HashMap<String, AssetSnapshot>,
        expired: Cell<usize>,
        _dir: TempDir,
    }

    impl VanishedResolver {
        fn new(names: &[&str]) -> Self {
            let dir = TempDir::new().unwrap();
            let env = FileEnvironment::new(dir.path(), "1");
            let mut snapshots = HashMap::new();
            for name in names {
                std::fs::write(dir.path().join(name), "gone").unwrap();
                let snapshot = env.find_asset(name).unwrap().unwrap();
                std::fs::remove_file(dir.path().join(name)).unwrap();
                snapshots.insert((*name).to_string(), snapshot);
            }
            Self {
                snapshots,
                expired: Cell::new(0),
                _dir: dir,
            }
        }
    }

    impl Environment for VanishedResolver {
        fn digest(&self) -> String {
            "e1".to_string()
        }

        fn stat(&self, path: &Path) -> Option<FileStat> {
            FileStat::of(path)
        }

        fn file_digest(&self, path: &Path) -> Result<String, AssetError> {
            Err(AssetError::read(path, std::io::Error::other("unreadable")))
        }
    }

    impl Resolver for VanishedResolver {
        fn find_asset(&self, logical_path: &str) -> Result<Option<AssetSnapshot>, AssetError> {
            Ok(self.snapshots.get(logical_path).cloned())
        }

        fn expire_index(&self) {
            self.expired.set(self.expired.get() + 1);
        }
    }

    fn header<'a>(response: &'a Response<AssetBody>, name: &str) -> &'a str {
        response.headers().get(name).unwrap().to_str().unwrap()
    }

    fn body_text(response: Response<AssetBody>) -> String {
        let bytes = response.into_body().collect_bytes().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn setup() -> (TempDir, FileEnvironment) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.js"), "var greeting = 'hi';").unwrap();
        std::fs::write(dir.path().join("héllo.txt"), "héllo").unwrap();
        let env = FileEnvironment::new(dir.path(), "1");
        (dir, env)
    }

    #[test]
    fn test_traversal_is_forbidden_without_lookup() {
        let resolver = FailingResolver::new();
        let response = call(&resolver, &AssetRequest::new("/../app.js")).unwrap();
        assert_eq!(response.status(), 403);
        assert_eq!(resolver.lookups.get(), 0);

        let response = call(&resolver, &AssetRequest::new("/js/%2e%2e/app.js")).unwrap();
        assert_eq!(response.status(), 403);
        assert_eq!(resolver.lookups.get(), 0);
    }

    #[test]
    fn test_serves_asset() {
        let (_dir, env) = setup();
        let response = call(&env, &AssetRequest::new("/app.js")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "Content-Type"), "application/javascript");
        assert_eq!(header(&response, "Content-Length"), "20");
        assert_eq!(header(&response, "Cache-Control"), "public, must-revalidate");
        assert!(header(&response, "ETag").starts_with('"'));
        assert!(header(&response, "Last-Modified").ends_with("GMT"));
        assert_eq!(body_text(response), "var greeting = 'hi';");
    }

    #[test]
    fn test_not_found() {
        let (_dir, env) = setup();
        let response = call(&env, &AssetRequest::new("/missing.js")).unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(header(&response, "X-Cascade"), "pass");
        assert_eq!(body_text(response), "Not found");
    }

    #[test]
    fn test_fingerprinted_path() {
        let (_dir, env) = setup();
        let digest = env.find_asset("app.js").unwrap().unwrap().digest().to_string();

        let path = format!("/app-{}.js", &digest[..12]);
        let response = call(&env, &AssetRequest::new(path)).unwrap();
        assert_eq!(response.status(), 200);
        let cache_control = header(&response, "Cache-Control");
        assert!(cache_control.contains("public"));
        assert!(cache_control.contains("max-age=31536000"));
    }

    #[test]
    fn test_conditional_requests() {
        let (_dir, env) = setup();
        let asset = env.find_asset("app.js").unwrap().unwrap();

        let request =
            AssetRequest::new("/app.js").with_if_none_match(format!("\"{}\"", asset.digest()));
        let response = call(&env, &request).unwrap();
        assert_eq!(response.status(), 304);
        assert!(response.headers().is_empty());
        assert!(body_text(response).is_empty());

        let request = AssetRequest::new("/app.js")
            .with_if_modified_since(cache::http_date(asset.mtime()));
        assert_eq!(call(&env, &request).unwrap().status(), 304);

        let request = AssetRequest::new("/app.js").with_if_none_match(asset.digest());
        assert_eq!(call(&env, &request).unwrap().status(), 200);
    }

    #[test]
    fn test_body_only_length_is_bytes() {
        let (_dir, env) = setup();
        let request = AssetRequest::new("/h%C3%A9llo.txt").with_body_only(true);
        let response = call(&env, &request).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "Content-Length"), "6");
        assert_eq!(body_text(response), "héllo");
    }

    #[test]
    fn test_script_failure_is_rendered() {
        let resolver = FailingResolver::new();
        let response = call(&resolver, &AssetRequest::new("/app.js")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "Content-Type"), "application/javascript");
        assert_eq!(resolver.expired.get(), 1);
        let body = body_text(response);
        assert!(body.starts_with("throw Error("));
        assert!(body.contains("CompileError: Undefined variable"));
    }

    #[test]
    fn test_stylesheet_failure_is_rendered() {
        let resolver = FailingResolver::new();
        let response = call(&resolver, &AssetRequest::new("/site.css")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "Content-Type"), "text/css; charset=utf-8");
        assert_eq!(resolver.expired.get(), 1);
        let body = body_text(response);
        assert!(body.contains("CompileError: Undefined variable \\0022 $brand\\0022 "));
        assert!(body.contains("site.css:4"));
    }

    #[test]
    fn test_other_failures_propagate() {
        let resolver = FailingResolver::new();
        let err = call(&resolver, &AssetRequest::new("/logo.png")).unwrap_err();
        assert_eq!(err.kind(), "CompileError");
        assert_eq!(resolver.expired.get(), 0);
    }

    #[test]
    fn test_read_failure_after_resolve_is_rendered() {
        let resolver = VanishedResolver::new(&["site.css", "app.js"]);

        let response = call(&resolver, &AssetRequest::new("/site.css")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(header(&response, "Content-Type"), "text/css; charset=utf-8");
        assert!(body_text(response).contains("ReadError: failed to read"));
        assert_eq!(resolver.expired.get(), 1);

        let request = AssetRequest::new("/app.js").with_body_only(true);
        let response = call(&resolver, &request).unwrap();
        assert_eq!(header(&response, "Content-Type"), "application/javascript");
        assert!(body_text(response).starts_with("throw Error(\"ReadError: "));
        assert_eq!(resolver.expired.get(), 2);
    }

    #[test]
    fn test_read_failure_after_resolve_propagates_for_images() {
        let resolver = VanishedResolver::new(&["logo.png"]);
        let err = call(&resolver, &AssetRequest::new("/logo.png")).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
        assert_eq!(resolver.expired.get(), 0);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::NotModified.status(), 304);
        assert_eq!(Outcome::ErrorRendered.status(), 200);
        assert_eq!(Outcome::ErrorRendered.label(), "200 Error Rendered");
        assert_eq!(Outcome::Failed.label(), "500 Internal Server Error");
    }
}
