//! Error types for the dirlay crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All error conditions raised by nested maps and directory layouts.
#[derive(Debug, Error)]
pub enum Error {
    /// An absolute path was supplied where a relative one is required.
    #[error("absolute path not allowed: {}", path.display())]
    AbsolutePath {
        /// The offending path.
        path: PathBuf,
    },

    /// A path segment is already occupied by a file where a directory is needed.
    #[error("path {} is not a directory", path.display())]
    NotADirectory {
        /// Path up to and including the conflicting segment.
        path: PathBuf,
    },

    /// A file path is already present in the tree, or an explicit base
    /// directory already exists on disk.
    #[error("path already exists: {}", path.display())]
    AlreadyExists {
        /// The duplicated path.
        path: PathBuf,
    },

    /// A path normalizes to nothing and cannot name a tree entry.
    #[error("invalid path: {path:?}")]
    InvalidPath {
        /// The offending path as given.
        path: String,
    },

    /// A nested-map key (or one of its intermediate segments) is absent.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// Key prefix up to the missing segment.
        key: String,
    },

    /// Path-key traversal hit a leaf value where a nested map was expected.
    #[error("not a nested map: {key}")]
    NotAContainer {
        /// Key prefix up to the leaf that blocked traversal.
        key: String,
    },

    /// A chdir target does not exist under the layout base directory.
    #[error("no such directory: {}", path.display())]
    NotFound {
        /// The missing path, relative to the base directory.
        path: PathBuf,
    },

    /// A filesystem operation was requested before the tree was materialized.
    #[error("directory tree has not been created")]
    NotMaterialized,

    /// An underlying filesystem operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
