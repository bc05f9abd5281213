//! Error types for bundle unpacking.

use thiserror::Error;

/// Errors that make a bundle unusable. Any of these fails the whole unpack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Bundle is missing manifest.json at its root")]
    MissingManifest,

    #[error("Invalid manifest.json: {0}")]
    ManifestParse(String),

    #[error("Bundle too large: {size} bytes (max {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Bundle contains an unsafe path: {0}")]
    UnsafePath(String),

    #[error("Failed to read bundle entry '{path}': {message}")]
    EntryRead { path: String, message: String },
}

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;
