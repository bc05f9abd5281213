//! Process-wide wiring: one store, the managers over it, and the HTTP app.

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;

use crate::channel::{ControlChannel, DEFAULT_QUEUE_DEPTH};
use crate::config::Config;
use crate::error::AssetResult;
use crate::extensions::ExtensionManager;
use crate::router::AssetRouter;
use crate::server::{self, AppState};
use crate::store::VirtualStore;
use crate::themes::ThemeManager;

/// Everything that shares the store, created once at startup.
#[derive(Clone)]
pub struct AssetService {
    pub store: Arc<dyn VirtualStore>,
    pub extensions: Arc<ExtensionManager>,
    pub themes: ThemeManager,
    pub assets: AssetRouter,
}

impl AssetService {
    /// Open the configured store and start the service over it.
    pub async fn open(config: &Config) -> AssetResult<Self> {
        let store = config.store.open().await?;
        Ok(Self::start(store, config).await)
    }

    /// Provision the theme directories and pick up namespaces already in
    /// the store.
    pub async fn start(store: Arc<dyn VirtualStore>, config: &Config) -> Self {
        let extensions = Arc::new(ExtensionManager::new(store.clone(), &config.install));
        let themes = ThemeManager::new(store.clone());
        let assets = AssetRouter::with_cache_control(store.clone(), &config.server.cache_control);

        if !themes.ensure_directories().await {
            tracing::warn!("Some theme directories could not be created");
        }
        extensions.recover().await;

        Self {
            store,
            extensions,
            themes,
            assets,
        }
    }

    pub fn channel(&self) -> ControlChannel {
        ControlChannel::new(self.extensions.clone(), self.themes.clone())
    }

    /// Spawn the control worker and build the HTTP app around it.
    pub fn app(&self, config: &Config) -> (Router, JoinHandle<()>) {
        let (channel, worker) = self.channel().spawn(DEFAULT_QUEUE_DEPTH);
        let state = AppState {
            assets: self.assets.clone(),
            channel,
        };
        let control_limit = server::control_body_limit(config.install.max_bundle_size);
        let app = server::app(state, config.server.static_dir.clone(), control_limit);
        (app, worker)
    }
}
