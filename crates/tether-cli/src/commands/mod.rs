//! Subcommand implementations and the settings they share

pub mod extract;
pub mod generate;
pub mod probe;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use std::env;
use std::path::PathBuf;
use tether_config::{Config, ConfigLoader};
use tether_contracts::{Markers, SourceText};

/// Annotation marker overrides
#[derive(Args, Debug, Default)]
pub struct MarkerArgs {
    /// Begin marker (defaults to [markers].begin, then "[export]")
    #[arg(long)]
    pub begin: Option<String>,
    /// End marker (defaults to [markers].end, then "[endexport]")
    #[arg(long)]
    pub end: Option<String>,
}

impl MarkerArgs {
    /// Flags over tether.toml over defaults
    pub fn resolve(self, config: &Config) -> Result<Markers> {
        let mut markers = config.project.markers();
        if let Some(begin) = self.begin {
            markers.begin = begin;
        }
        if let Some(end) = self.end {
            markers.end = end;
        }
        markers
            .validate()
            .map_err(|reason| anyhow!("Invalid markers: {}", reason))?;
        Ok(markers)
    }
}

/// Project configuration for the working directory
pub fn load_config() -> Result<Config> {
    let cwd = env::current_dir().context("Failed to read working directory")?;
    ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load tether.toml")
}

/// Sources from the command line, or the configured ones
pub fn source_paths(files: Vec<PathBuf>, config: &Config) -> Result<Vec<PathBuf>> {
    let files = if files.is_empty() {
        config.sources()
    } else {
        files
    };
    if files.is_empty() {
        bail!("No source files given and none configured in [bindings].sources");
    }
    Ok(files)
}

/// Library base from the command line, or the configured one
pub fn library_base(library: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    library
        .or_else(|| config.library_base())
        .context("No library given: pass --library or set [library].base in tether.toml")
}

/// Read every source, failing on the first unreadable file
pub fn read_sources(files: &[PathBuf]) -> Result<Vec<SourceText>> {
    files
        .iter()
        .map(|path| {
            tracing::debug!(path = %path.display(), "reading source");
            SourceText::from_path(path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))
        })
        .collect()
}
