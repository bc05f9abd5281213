//! Error types for assetd
//!
//! Module-level errors (store, bundle, install) are folded into
//! [`AssetError`] at the crate boundary.

use thiserror::Error;

use crate::bundle::BundleError;
use crate::store::StoreError;

/// Errors that can occur while setting up or driving the asset store
#[derive(Debug, Error)]
pub enum AssetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Virtual store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Bundle decoding errors
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for assetd operations
pub type AssetResult<T> = Result<T, AssetError>;
