//! Asset error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while resolving, reading or reconstituting an asset.
///
/// "Not found" is never an error: resolvers report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Compile {
        path: PathBuf,
        message: String,
        /// First frame of the failure, e.g. `app.css:12`
        location: Option<String>,
    },

    #[error("invalid snapshot record: {0}")]
    Record(String),

    #[error("malformed snapshot record")]
    Json(#[from] serde_json::Error),
}

impl AssetError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Stable name of the failure kind, shown to the browser when rendered
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "ReadError",
            Self::Compile { .. } => "CompileError",
            Self::Record(_) | Self::Json(_) => "RecordError",
        }
    }

    /// First trace frame of the failure, if one is known
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Read { path, .. } => Some(path.display().to_string()),
            Self::Compile { path, location, .. } => location
                .clone()
                .or_else(|| Some(path.display().to_string())),
            Self::Record(_) | Self::Json(_) => None,
        }
    }
}
