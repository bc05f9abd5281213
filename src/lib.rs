//! assetd - a request-intercepting virtual asset store.
//!
//! Extension bundles (zip or tar.gz archives carrying a `manifest.json`) are
//! unpacked into per-extension namespaces of a virtual store and served back
//! under `/internal/extensions/{id}/...`. Theme assets live in three fixed
//! categories served under `/internal/themes/{category}/{filename}`.
//!
//! # Architecture
//!
//! - [`store`] - Hierarchical path → bytes store (memory or disk)
//! - [`bundle`] - Archive decoding and manifest validation
//! - [`extensions`] - Namespace install/remove and lifecycle state
//! - [`themes`] - Category-scoped theme uploads
//! - [`router`] - Request path → store path mapping and responses
//! - [`channel`] - Control messages and the worker that dispatches them
//! - [`server`] - axum app with the interception middleware
//!
//! # Example
//!
//! ```ignore
//! use assetd::{AssetService, Config};
//!
//! let config = Config::load();
//! let service = AssetService::open(&config).await?;
//! let (app, _worker) = service.app(&config);
//! assetd::server::serve(&config.server.listen, app).await?;
//! ```

pub mod bundle;
pub mod channel;
pub mod cli;
pub mod config;
pub mod extensions;
pub mod router;
pub mod server;
pub mod store;
pub mod themes;

mod error;
mod service;

pub use config::Config;
pub use error::{AssetError, AssetResult};
pub use extensions::{ExtensionManager, NamespaceState};
pub use router::AssetRouter;
pub use service::AssetService;
pub use store::{MemoryStore, VirtualStore};
pub use themes::{Category, ThemeManager};
