//! Error types for extension install and removal.

use thiserror::Error;

use crate::bundle::BundleError;
use crate::store::StoreError;

/// Errors that can occur while installing a bundle.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The bundle never decoded; nothing was written.
    #[error("Invalid bundle: {0}")]
    Bundle(#[from] BundleError),

    #[error("Failed to prepare namespace '{id}': {source}")]
    Prepare { id: String, source: StoreError },

    /// Some writes failed. The rest were left in place.
    #[error("{failed} of {total} files failed to install for '{id}': {first}")]
    PartialWrite {
        id: String,
        failed: usize,
        total: usize,
        first: StoreError,
    },
}

/// Errors that can occur while removing a namespace.
#[derive(Debug, Error)]
pub enum RemoveError {
    #[error("Invalid extension id: {0:?}")]
    InvalidId(String),

    #[error("Extension '{0}' is not installed")]
    NotInstalled(String),

    #[error("Failed to list extension '{id}': {source}")]
    List { id: String, source: StoreError },

    /// Entries could not all be deleted, so the namespace directory stayed.
    #[error("Failed to remove extension '{id}' ({failed} entries left behind): {source}")]
    Incomplete {
        id: String,
        failed: usize,
        source: StoreError,
    },
}

/// Result type for install operations.
pub type InstallResult<T> = Result<T, InstallError>;
