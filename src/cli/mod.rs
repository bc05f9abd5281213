//! CLI commands for assetd.
//!
//! `serve` runs the HTTP front end; the other commands operate on the
//! configured store directly.

pub mod install;
pub mod serve;
pub mod theme;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "assetd")]
#[command(about = "Virtual asset store for extension bundles and theme files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/assetd/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve installed assets over HTTP
    Serve {
        /// Address to listen on (overrides the config)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Install an extension from a zip, tar.gz, or directory
    Install {
        /// Path to the bundle or extension directory
        path: PathBuf,
    },

    /// Remove an installed extension
    Remove {
        /// Extension id
        id: String,
    },

    /// List installed extensions
    List,

    /// Manage theme files
    Theme {
        #[command(subcommand)]
        what: ThemeCommands,
    },

    /// Pack an extension directory into a bundle
    Pack {
        /// Extension directory containing manifest.json
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (default: <id>.zip or <id>.tar.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Archive format
        #[arg(long, value_enum, default_value_t = PackFormat::Zip)]
        format: PackFormat,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    /// Upload a file into a category
    Upload {
        /// backgrounds, logos, or icons
        category: String,

        /// File to upload
        file: PathBuf,

        /// Stored file name (defaults to the file's name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove a file from a category
    Remove {
        category: String,
        filename: String,
    },

    /// List the files in a category
    List { category: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PackFormat {
    Zip,
    TarGz,
}

impl PackFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PackFormat::Zip => "zip",
            PackFormat::TarGz => "tar.gz",
        }
    }
}

/// Load the config named on the command line, or the default one.
pub fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::load()),
    }
}

/// Run the parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { listen } => serve::run_serve(config, listen).await,
        Commands::Install { path } => install::run_install(&config, &path).await,
        Commands::Remove { id } => install::run_remove(&config, &id).await,
        Commands::List => install::run_list(&config).await,
        Commands::Theme { what } => match what {
            ThemeCommands::Upload {
                category,
                file,
                name,
            } => theme::run_upload(&config, &category, &file, name.as_deref()).await,
            ThemeCommands::Remove { category, filename } => {
                theme::run_remove(&config, &category, &filename).await
            }
            ThemeCommands::List { category } => theme::run_list(&config, &category).await,
        },
        Commands::Pack {
            path,
            output,
            format,
        } => install::run_pack(&path, output, format),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
