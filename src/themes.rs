//! Theme asset categories.
//!
//! Backgrounds, logos, and icons each live in a fixed directory at the
//! store root. The directories are provisioned once and never removed;
//! uploads add single files to them.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::path::{is_single_segment, join_path};
use crate::store::{ensure_directory, StoreError, VirtualStore};

/// A fixed theme asset category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Backgrounds,
    Logos,
    Icons,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Backgrounds, Category::Logos, Category::Icons];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backgrounds => "backgrounds",
            Self::Logos => "logos",
            Self::Icons => "icons",
        }
    }

    /// Store directory for this category.
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Backgrounds => "/backgrounds",
            Self::Logos => "/logos",
            Self::Icons => "/icons",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown theme category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Adds, removes, and lists files in the theme categories.
#[derive(Clone)]
pub struct ThemeManager {
    store: Arc<dyn VirtualStore>,
}

impl ThemeManager {
    pub fn new(store: Arc<dyn VirtualStore>) -> Self {
        Self { store }
    }

    /// Create every category directory. Existing ones are left alone.
    pub async fn ensure_directories(&self) -> bool {
        let mut ok = true;
        for category in Category::ALL {
            if let Err(e) = ensure_directory(self.store.as_ref(), category.dir()).await {
                tracing::error!("Failed to create {}: {}", category.dir(), e);
                ok = false;
            }
        }
        ok
    }

    /// Store `content` as `filename` in `category`, overwriting any file of
    /// the same name.
    pub async fn upload(&self, category: Category, filename: &str, content: &[u8]) -> bool {
        let path = match file_path(category, filename) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Rejected upload to {}: {}", category, e);
                return false;
            }
        };

        // The directory may have been lost since startup.
        if let Err(e) = ensure_directory(self.store.as_ref(), category.dir()).await {
            tracing::error!("Failed to create {}: {}", category.dir(), e);
            return false;
        }

        match self.store.write(&path, content).await {
            Ok(()) => {
                tracing::info!("Uploaded {} ({} bytes)", path, content.len());
                true
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {}", path, e);
                false
            }
        }
    }

    /// Delete one file from `category`.
    pub async fn remove_file(&self, category: Category, filename: &str) -> bool {
        let path = match file_path(category, filename) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Rejected removal from {}: {}", category, e);
                return false;
            }
        };

        match self.store.remove(&path).await {
            Ok(()) => {
                tracing::info!("Removed {}", path);
                true
            }
            Err(e) => {
                tracing::error!("Failed to remove {}: {}", path, e);
                false
            }
        }
    }

    /// Names of the files in `category`; empty when it cannot be listed.
    pub async fn list(&self, category: Category) -> Vec<String> {
        match self.store.list(category.dir()).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Failed to list {}: {}", category.dir(), e);
                Vec::new()
            }
        }
    }
}

fn file_path(category: Category, filename: &str) -> Result<String, StoreError> {
    if !is_single_segment(filename) {
        return Err(StoreError::InvalidPath {
            path: filename.to_string(),
            reason: "filename must be a single path segment",
        });
    }
    Ok(join_path(category.dir(), filename))
}
