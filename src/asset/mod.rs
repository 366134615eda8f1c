//! Asset module
//!
//! The snapshot entity the delivery layer serves, the collaborator traits it
//! is resolved through, and a directory-backed resolver.

pub mod digest;
pub mod environment;
pub mod error;
pub mod files;
pub mod snapshot;

pub use environment::{Environment, FileStat, Resolver};
pub use error::AssetError;
pub use files::FileEnvironment;
pub use snapshot::{AssetChunks, AssetKind, AssetSnapshot, SnapshotRecord};
