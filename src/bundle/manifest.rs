//! Bundle manifest parsing.
//!
//! Every bundle carries a `manifest.json` at its root. Only `id` is
//! required; it names the namespace the bundle installs into. Other fields
//! are kept so they can be logged or echoed back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{BundleError, BundleResult};
use crate::store::path::is_single_segment;

/// Parsed `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleManifest {
    /// Namespace identity. Must be usable as a single path segment.
    pub id: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form version string.
    #[serde(default)]
    pub version: Option<String>,

    /// Anything else the bundle author put in the manifest.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BundleManifest {
    /// Name of the manifest entry at the bundle root.
    pub const FILE_NAME: &'static str = "manifest.json";

    /// Parse and validate manifest bytes.
    pub fn parse(content: &[u8]) -> BundleResult<Self> {
        let manifest: Self = serde_json::from_slice(content)
            .map_err(|e| BundleError::ManifestParse(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest for required fields and constraints.
    pub fn validate(&self) -> BundleResult<()> {
        if self.id.trim().is_empty() {
            return Err(BundleError::ManifestParse("id is required".to_string()));
        }

        if !is_single_segment(&self.id) {
            return Err(BundleError::ManifestParse(format!(
                "id '{}' must not contain path separators or dot segments",
                self.id
            )));
        }

        Ok(())
    }

    /// Name for log lines: `name` when present, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
