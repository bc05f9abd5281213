use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundle::{DEFAULT_MAX_BUNDLE_SIZE, DEFAULT_UNPACK_RATIO};
use crate::error::{AssetError, AssetResult};
use crate::store::{DiskStore, MemoryStore, VirtualStore};

/// Smallest accepted bundle size limit (1 KB).
const MIN_BUNDLE_SIZE: usize = 1024;
/// Largest accepted bundle size limit (512 MB).
const MAX_BUNDLE_SIZE: usize = 512 * 1024 * 1024;
/// Largest accepted decompression ratio.
const MAX_UNPACK_RATIO: usize = 64;

pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Directory served for requests the asset routes do not intercept.
    pub static_dir: Option<PathBuf>,
    pub cache_control: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Disk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub max_bundle_size: usize,
    /// Decompressed bytes allowed per bundle, as a multiple of `max_bundle_size`.
    pub max_unpacked_ratio: usize,
    /// Queue overlapping install/remove calls for the same namespace.
    pub serialize_namespaces: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            static_dir: None,
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Disk,
            data_dir: None,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            max_bundle_size: DEFAULT_MAX_BUNDLE_SIZE,
            max_unpacked_ratio: DEFAULT_UNPACK_RATIO,
            serialize_namespaces: true,
        }
    }
}

impl StoreConfig {
    /// Data directory, falling back to the platform data dir.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("assetd"))
                .unwrap_or_else(|| {
                    dirs::home_dir()
                        .map(|h| h.join(".assetd"))
                        .unwrap_or_else(|| PathBuf::from(".assetd"))
                })
        })
    }

    /// Open the configured backend. Called once per process.
    pub async fn open(&self) -> AssetResult<Arc<dyn VirtualStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreBackend::Disk => {
                let store = DiskStore::open(self.resolved_data_dir()).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

impl InstallConfig {
    /// Cap on the total decompressed size of one bundle.
    pub fn max_unpacked_size(&self) -> usize {
        self.max_bundle_size.saturating_mul(self.max_unpacked_ratio)
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("assetd")
            .join("config.toml")
    }

    /// Load config from the default location, or return defaults if it is
    /// missing or unreadable
    pub fn load() -> Self {
        let path = Self::config_path();

        let mut config = if path.exists() {
            match Self::read_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to load config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate();
        config
    }

    /// Load config from an explicit file. Errors are returned, not defaulted.
    pub fn load_from(path: &Path) -> AssetResult<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate();
        Ok(config)
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> AssetResult<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.validate();
        Ok(config)
    }

    fn read_file(path: &Path) -> AssetResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AssetError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(listen) = std::env::var("ASSETD_LISTEN") {
            self.server.listen = listen;
        }
        if let Ok(dir) = std::env::var("ASSETD_DATA_DIR") {
            self.store.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Validate and clamp config values to acceptable ranges
    fn validate(&mut self) {
        self.install.max_bundle_size = self
            .install
            .max_bundle_size
            .clamp(MIN_BUNDLE_SIZE, MAX_BUNDLE_SIZE);
        self.install.max_unpacked_ratio = self.install.max_unpacked_ratio.clamp(1, MAX_UNPACK_RATIO);

        if self.server.cache_control.trim().is_empty() {
            self.server.cache_control = DEFAULT_CACHE_CONTROL.to_string();
        }
    }

    /// Render the effective config as TOML
    pub fn to_toml(&self) -> AssetResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AssetError::Config(format!("failed to serialize config: {}", e)))
    }
}
