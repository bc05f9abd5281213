//! `assetd serve`.

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::server;
use crate::service::AssetService;

pub async fn run_serve(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(listen) = listen {
        config.server.listen = listen;
    }

    let service = AssetService::open(&config)
        .await
        .context("Failed to open the asset store")?;
    let installed = service.extensions.installed().await;

    println!(
        "{} Serving {} extension(s) on {}",
        style("→").cyan(),
        installed.len(),
        style(format!("http://{}", config.server.listen)).bold()
    );
    if let Some(dir) = &config.server.static_dir {
        println!(
            "{} {}",
            style("Static files:").bold(),
            style(dir.display()).dim()
        );
    }

    let (app, worker) = service.app(&config);
    server::serve(&config.server.listen, app)
        .await
        .with_context(|| format!("Failed to serve on {}", config.server.listen))?;

    worker.abort();
    Ok(())
}
