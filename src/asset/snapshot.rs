//! Asset snapshot entity
//!
//! An immutable record of one compiled artifact at a point in time: where it
//! lives, what it contains (by digest) and which compiling environment
//! produced it. Snapshots are never updated; a stale snapshot is replaced by
//! resolving the asset again.

use super::environment::Environment;
use super::error::AssetError;
use chrono::{DateTime, SecondsFormat, Utc};
use hyper::body::Bytes;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 16 * 1024;

/// Concrete kind of a compiled asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Served byte-for-byte from disk
    #[serde(rename = "StaticAsset")]
    Static,
    /// Output of a single processing step
    #[serde(rename = "ProcessedAsset")]
    Processed,
    /// Concatenation of an asset with its requirements
    #[serde(rename = "BundledAsset")]
    Bundled,
}

/// Serialized form of a snapshot
///
/// `mtime` is RFC 3339 text with nanosecond precision so that a record read
/// back compares identically to the live snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub class: AssetKind,
    pub logical_path: String,
    pub physical_location: String,
    pub content_type: String,
    pub mtime: String,
    pub digest: String,
    pub length: u64,
    pub environment_digest: String,
}

#[derive(Debug, Clone)]
pub struct AssetSnapshot {
    kind: AssetKind,
    logical_path: String,
    physical_location: PathBuf,
    content_type: String,
    mtime: DateTime<Utc>,
    length: u64,
    digest: String,
    environment_digest: String,
}

impl AssetSnapshot {
    /// Build a snapshot from the file as it is on disk right now
    pub fn build<E: Environment + ?Sized>(
        env: &E,
        kind: AssetKind,
        logical_path: &str,
        physical_location: &Path,
    ) -> Result<Self, AssetError> {
        let stat = env.stat(physical_location).ok_or_else(|| {
            AssetError::read(
                physical_location,
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )
        })?;
        let digest = env.file_digest(physical_location)?;

        Ok(Self {
            kind,
            logical_path: logical_path.to_string(),
            physical_location: physical_location.to_path_buf(),
            content_type: env.content_type_of(logical_path).to_string(),
            mtime: stat.mtime,
            length: stat.size,
            digest,
            environment_digest: env.digest(),
        })
    }

    /// Reconstitute a snapshot from a persisted record
    ///
    /// Persisted fields are trusted as-is: nothing is read from disk and no
    /// digest is recomputed. Freshness is decided later by [`Self::is_fresh`].
    pub fn from_record(record: SnapshotRecord) -> Result<Self, AssetError> {
        let mtime = DateTime::parse_from_rfc3339(&record.mtime)
            .map_err(|e| AssetError::Record(format!("mtime `{}`: {e}", record.mtime)))?
            .with_timezone(&Utc);

        for (field, value) in [
            ("physical_location", &record.physical_location),
            ("digest", &record.digest),
            ("environment_digest", &record.environment_digest),
        ] {
            if value.is_empty() {
                return Err(AssetError::Record(format!("{field} is empty")));
            }
        }

        Ok(Self {
            kind: record.class,
            logical_path: record.logical_path,
            physical_location: PathBuf::from(record.physical_location),
            content_type: record.content_type,
            mtime,
            length: record.length,
            digest: record.digest,
            environment_digest: record.environment_digest,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        let record: SnapshotRecord = serde_json::from_str(json)?;
        Self::from_record(record)
    }

    pub fn to_record(&self) -> SnapshotRecord {
        SnapshotRecord {
            class: self.kind,
            logical_path: self.logical_path.clone(),
            physical_location: self.physical_location.to_string_lossy().into_owned(),
            content_type: self.content_type.clone(),
            mtime: self.mtime.to_rfc3339_opts(SecondsFormat::Nanos, true),
            digest: self.digest.clone(),
            length: self.length,
            environment_digest: self.environment_digest.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Whether this snapshot still describes what `env` would produce
    ///
    /// Checks run cheapest first and stop at the first decisive answer:
    /// environment digest, then file mtime, then a full content digest.
    pub fn is_fresh<E: Environment + ?Sized>(&self, env: &E) -> bool {
        if env.digest() != self.environment_digest {
            return false;
        }

        let Some(stat) = env.stat(&self.physical_location) else {
            return false;
        };
        if stat.mtime <= self.mtime {
            return true;
        }

        // Touched but possibly unchanged
        env.file_digest(&self.physical_location)
            .is_ok_and(|digest| digest == self.digest)
    }

    /// Read the full content into memory
    pub fn source(&self) -> Result<Bytes, AssetError> {
        std::fs::read(&self.physical_location)
            .map(Bytes::from)
            .map_err(|e| AssetError::read(&self.physical_location, e))
    }

    /// Open the content as a lazy sequence of chunks
    pub fn chunks(&self) -> Result<AssetChunks, AssetError> {
        let file = File::open(&self.physical_location)
            .map_err(|e| AssetError::read(&self.physical_location, e))?;
        Ok(AssetChunks { file: Some(file) })
    }

    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    pub fn physical_location(&self) -> &Path {
        &self.physical_location
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub const fn mtime(&self) -> DateTime<Utc> {
        self.mtime
    }

    pub const fn length(&self) -> u64 {
        self.length
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn environment_digest(&self) -> &str {
        &self.environment_digest
    }
}

// Same bytes at the same place and time are the same asset, whatever name
// or content type it was looked up under.
impl PartialEq for AssetSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.physical_location == other.physical_location
            && self.mtime == other.mtime
            && self.digest == other.digest
    }
}

impl Eq for AssetSnapshot {}

impl Hash for AssetSnapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.physical_location.hash(state);
        self.mtime.hash(state);
        self.digest.hash(state);
    }
}

/// Lazy chunked reader over an asset's file
#[derive(Debug)]
pub struct AssetChunks {
    file: Option<File>,
}

impl AssetChunks {
    /// Chunks that yield nothing
    pub const fn exhausted() -> Self {
        Self { file: None }
    }
}

impl Iterator for AssetChunks {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.file.as_mut()?;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        match file.read(&mut buffer) {
            Ok(0) => {
                self.file = None;
                None
            }
            Ok(n) => {
                buffer.truncate(n);
                Some(Ok(Bytes::from(buffer)))
            }
            Err(e) => {
                self.file = None;
                Some(Err(e))
            }
        }
    }
}
