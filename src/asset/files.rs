//! Directory-backed resolver for precompiled assets
//!
//! Serves whatever a build step already wrote under a root directory. Lookups
//! are memoized in an index; an entry is reused only while its snapshot is
//! still fresh. The index can be persisted as JSON lines so a restarted
//! server starts warm.

use super::digest::hexdigest_file;
use super::environment::{Environment, FileStat, Resolver};
use super::error::AssetError;
use super::snapshot::{AssetKind, AssetSnapshot, SnapshotRecord};
use crate::logger;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub struct FileEnvironment {
    root: PathBuf,
    digest: String,
    index: RwLock<HashMap<String, AssetSnapshot>>,
}

impl FileEnvironment {
    /// Create an environment over `root`
    ///
    /// `version` is folded into the environment digest: bumping it
    /// invalidates every snapshot taken under the old value.
    pub fn new(root: impl Into<PathBuf>, version: &str) -> Self {
        let root = root.into();
        let mut hasher = blake3::Hasher::new();
        hasher.update(env!("CARGO_PKG_VERSION").as_bytes());
        hasher.update(b"\0");
        hasher.update(version.as_bytes());
        hasher.update(b"\0");
        hasher.update(root.to_string_lossy().as_bytes());

        Self {
            root,
            digest: hasher.finalize().to_hex().to_string(),
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Number of snapshots currently indexed
    pub fn indexed(&self) -> usize {
        self.index.read().map_or(0, |index| index.len())
    }

    /// Load persisted snapshot records, one JSON object per line
    ///
    /// Malformed lines are logged and skipped. Returns how many records were
    /// loaded; staleness is checked later, on lookup.
    pub fn load_index(&self, path: &Path) -> Result<usize, AssetError> {
        let file = File::open(path).map_err(|e| AssetError::read(path, e))?;
        let reader = BufReader::new(file);
        let mut loaded = HashMap::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| AssetError::read(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match AssetSnapshot::from_json(&line) {
                Ok(snapshot) => {
                    loaded.insert(snapshot.logical_path().to_string(), snapshot);
                }
                Err(e) => logger::log_warning(&format!(
                    "Skipping snapshot record {}:{}: {e}",
                    path.display(),
                    number + 1
                )),
            }
        }

        let count = loaded.len();
        if let Ok(mut index) = self.index.write() {
            index.extend(loaded);
        }
        Ok(count)
    }

    /// Persist every indexed snapshot as JSON lines
    pub fn save_index(&self, path: &Path) -> Result<usize, AssetError> {
        let records: Vec<SnapshotRecord> = match self.index.read() {
            Ok(index) => index.values().map(AssetSnapshot::to_record).collect(),
            Err(_) => Vec::new(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AssetError::read(parent, e))?;
            }
        }

        let mut file = File::create(path).map_err(|e| AssetError::read(path, e))?;
        for record in &records {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{json}").map_err(|e| AssetError::read(path, e))?;
        }
        Ok(records.len())
    }

    /// Map a logical path onto a file under the root, refusing escapes
    fn locate(&self, logical_path: &str) -> Option<PathBuf> {
        let root = self.root.canonicalize().ok()?;
        let candidate = root.join(logical_path).canonicalize().ok()?;
        if !candidate.starts_with(&root) {
            logger::log_warning(&format!(
                "Asset lookup escaped root: {logical_path} -> {}",
                candidate.display()
            ));
            return None;
        }
        candidate.is_file().then_some(candidate)
    }

    fn cached(&self, logical_path: &str) -> Option<AssetSnapshot> {
        let snapshot = self.index.read().ok()?.get(logical_path).cloned()?;
        if snapshot.is_fresh(self) {
            return Some(snapshot);
        }
        if let Ok(mut index) = self.index.write() {
            index.remove(logical_path);
        }
        None
    }
}

impl Environment for FileEnvironment {
    fn digest(&self) -> String {
        self.digest.clone()
    }

    fn stat(&self, path: &Path) -> Option<FileStat> {
        FileStat::of(path)
    }

    fn file_digest(&self, path: &Path) -> Result<String, AssetError> {
        hexdigest_file(path).map_err(|e| AssetError::read(path, e))
    }
}

impl Resolver for FileEnvironment {
    fn find_asset(&self, logical_path: &str) -> Result<Option<AssetSnapshot>, AssetError> {
        if let Some(snapshot) = self.cached(logical_path) {
            return Ok(Some(snapshot));
        }

        let Some(physical) = self.locate(logical_path) else {
            return Ok(None);
        };

        let snapshot = AssetSnapshot::build(self, AssetKind::Static, logical_path, &physical)?;
        if let Ok(mut index) = self.index.write() {
            index.insert(logical_path.to_string(), snapshot.clone());
        }
        Ok(Some(snapshot))
    }

    fn expire_index(&self) {
        if let Ok(mut index) = self.index.write() {
            index.clear();
        }
    }
}
