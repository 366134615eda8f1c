//! Collaborator interfaces consumed by the delivery layer.
//!
//! Any host that can look up compiled assets and answer a few questions about
//! the filesystem can be served: implement [`Environment`] for the cheap
//! metadata queries and [`Resolver`] for the lookup itself.

use super::error::AssetError;
use super::snapshot::AssetSnapshot;
use crate::http::mime;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Filesystem metadata for one physical file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mtime: DateTime<Utc>,
    pub size: u64,
}

impl FileStat {
    /// Read metadata from disk, `None` if the file is missing or unreadable
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        let mtime = metadata.modified().ok()?;
        Some(Self {
            mtime: DateTime::<Utc>::from(mtime),
            size: metadata.len(),
        })
    }
}

/// The compiling environment an asset was produced in
pub trait Environment {
    /// Fingerprint over the whole compiling configuration
    fn digest(&self) -> String;

    fn stat(&self, path: &Path) -> Option<FileStat>;

    /// Content digest of the file at `path`, lowercase hex
    fn file_digest(&self, path: &Path) -> Result<String, AssetError>;

    /// Extension-based content type; usable without a resolved asset
    fn content_type_of(&self, path: &str) -> &'static str {
        mime::content_type_of(path)
    }
}

/// Looks up assets by logical path
pub trait Resolver: Environment {
    /// `Ok(None)` when nothing matches; `Err` only for read or compile failures
    fn find_asset(&self, logical_path: &str) -> Result<Option<AssetSnapshot>, AssetError>;

    /// Drop any cached lookups so the next request re-resolves from scratch
    fn expire_index(&self) {}
}
