//! Theme commands: `theme upload`, `theme remove`, and `theme list`.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use console::style;

use crate::config::Config;
use crate::service::AssetService;
use crate::themes::Category;

fn parse_category(name: &str) -> Result<Category> {
    name.parse::<Category>()
        .map_err(|e| anyhow!("{} (expected backgrounds, logos, or icons)", e))
}

pub async fn run_upload(
    config: &Config,
    category: &str,
    file: &Path,
    name: Option<&str>,
) -> Result<()> {
    let category = parse_category(category)?;
    let name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Cannot derive a file name from {}", file.display()))?,
    };
    let data = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let service = AssetService::open(config).await?;
    if !service.themes.upload(category, &name, &data).await {
        bail!("Failed to upload {} to {}", name, category);
    }

    println!(
        "{} Uploaded {} ({} bytes)",
        style("✓").green().bold(),
        style(format!("/internal/themes/{}/{}", category, name)).bold(),
        data.len()
    );
    Ok(())
}

pub async fn run_remove(config: &Config, category: &str, filename: &str) -> Result<()> {
    let category = parse_category(category)?;
    let service = AssetService::open(config).await?;
    if !service.themes.remove_file(category, filename).await {
        bail!("Failed to remove {} from {}", filename, category);
    }

    println!(
        "{} Removed {} from {}",
        style("✓").green().bold(),
        style(filename).bold(),
        category
    );
    Ok(())
}

pub async fn run_list(config: &Config, category: &str) -> Result<()> {
    let category = parse_category(category)?;
    let service = AssetService::open(config).await?;
    let files = service.themes.list(category).await;

    if files.is_empty() {
        println!("{}", style(format!("No files in {}", category)).dim());
        return Ok(());
    }

    println!("{}", style(format!("{}:", category)).bold());
    for file in files {
        println!("  {} {}", style("•").cyan(), file);
    }
    Ok(())
}
