//! Extension commands: `install`, `remove`, `list`, and `pack`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use console::style;
use walkdir::WalkDir;

use super::PackFormat;
use crate::bundle::{pack, Bundle};
use crate::config::{Config, StoreBackend};
use crate::service::AssetService;

/// Install extension from a bundle file or an unpacked directory.
pub async fn run_install(config: &Config, path: &Path) -> Result<()> {
    warn_if_ephemeral(config);
    let service = AssetService::open(config).await?;

    let result = if path.is_dir() {
        let bundle = Bundle::from_blobs(read_directory(path)?)
            .with_context(|| format!("Not a valid extension: {}", path.display()))?;
        println!(
            "{} Installing {} from {}...",
            style("→").cyan(),
            style(bundle.id()).bold(),
            style(path.display()).dim()
        );
        service.extensions.install_bundle(bundle).await
    } else {
        let data =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        println!(
            "{} Installing {}...",
            style("→").cyan(),
            style(path.display()).bold()
        );
        service.extensions.install_bundle_bytes(&data).await
    };

    let report = result.context("Install failed")?;

    println!(
        "{} {} {}",
        style("✓").green().bold(),
        style("Installed").cyan(),
        style(&report.id).bold()
    );
    println!();
    println!("{} {}", style("Extension:").bold(), report.name);
    println!("{} {}", style("Files:").bold(), report.files);
    println!("{} {} bytes", style("Size:").bold(), report.bytes);
    println!("{} {}", style("Checksum:").bold(), style(&report.checksum).dim());
    println!(
        "{} /internal/extensions/{}/",
        style("Served at:").bold(),
        report.id
    );

    Ok(())
}

/// Remove an installed extension.
pub async fn run_remove(config: &Config, id: &str) -> Result<()> {
    let service = AssetService::open(config).await?;
    let report = service
        .extensions
        .try_remove(id)
        .await
        .context("Remove failed")?;

    println!(
        "{} Removed {} ({} files, {} directories)",
        style("✓").green().bold(),
        style(&report.id).bold(),
        report.files,
        report.directories
    );
    Ok(())
}

/// List installed extensions.
pub async fn run_list(config: &Config) -> Result<()> {
    let service = AssetService::open(config).await?;
    let installed = service.extensions.installed().await;

    if installed.is_empty() {
        println!("{}", style("No extensions installed").dim());
        return Ok(());
    }

    println!("{}", style("Installed extensions:").bold());
    for id in installed {
        println!("  {} {}", style("•").cyan(), id);
    }
    Ok(())
}

/// Pack an extension directory into a zip or tar.gz bundle.
pub fn run_pack(dir: &Path, output: Option<PathBuf>, format: PackFormat) -> Result<()> {
    let files = read_directory(dir)?;

    // Validate before writing anything.
    let bundle = Bundle::from_blobs(files.clone())
        .with_context(|| format!("Not a valid extension: {}", dir.display()))?;

    let data = match format {
        PackFormat::Zip => pack::zip_bundle(&files)?,
        PackFormat::TarGz => pack::tar_gz_bundle(&files)?,
    };

    let output = output
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", bundle.id(), format.extension())));
    fs::write(&output, &data)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Packed {} ({} files, {} bytes) into {}",
        style("✓").green().bold(),
        style(bundle.id()).bold(),
        bundle.entries.len(),
        data.len(),
        style(output.display()).dim()
    );
    Ok(())
}

/// Collect every regular file under `dir` with its `/`-separated relative path.
fn read_directory(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("Unexpected path {}", entry.path().display()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let content = fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        files.push((name, content));
    }

    Ok(files)
}

fn warn_if_ephemeral(config: &Config) {
    if config.store.backend == StoreBackend::Memory {
        println!(
            "{} The memory store does not outlive this command",
            style("!").yellow().bold()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("js/lib")).unwrap();
        fs::write(temp.path().join("manifest.json"), r#"{"id":"dir-ext"}"#).unwrap();
        fs::write(temp.path().join("js/lib/util.js"), "u()").unwrap();

        let files = read_directory(temp.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["js/lib/util.js", "manifest.json"]);

        let bundle = Bundle::from_blobs(files).unwrap();
        assert_eq!(bundle.id(), "dir-ext");
    }

    #[test]
    fn test_pack_round_trips_through_unpack() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("img")).unwrap();
        fs::write(src.join("manifest.json"), r#"{"id":"packed"}"#).unwrap();
        fs::write(src.join("img/a.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let out = temp.path().join("out.tar.gz");
        run_pack(&src, Some(out.clone()), PackFormat::TarGz).unwrap();

        let bundle = crate::bundle::unpack(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(bundle.id(), "packed");
        assert_eq!(bundle.entries.len(), 2);
    }

    #[test]
    fn test_pack_requires_manifest() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "x").unwrap();
        assert!(run_pack(temp.path(), None, PackFormat::Zip).is_err());
    }
}
