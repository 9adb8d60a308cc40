//! Probe command - check a built library against its contracts

use anyhow::{bail, Result};
use std::path::PathBuf;
use tether_contracts::{ContractExtractor, Markers};
use tether_runtime::LibraryLoader;

pub struct ProbeArgs {
    pub library: PathBuf,
    pub files: Vec<PathBuf>,
    pub markers: Markers,
}

pub fn run(args: ProbeArgs) -> Result<()> {
    let sources = super::read_sources(&args.files)?;
    let extraction = ContractExtractor::new(args.markers).extract(&sources);
    for diagnostic in &extraction.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    let handle = LibraryLoader::new().open(&args.library)?;
    tracing::info!(library = %handle.describe(), "loaded library");
    println!("loaded {}", handle.describe());

    let mut missing = Vec::new();
    for declaration in &extraction.declarations {
        if handle.resolve(declaration.name()).is_ok() {
            tracing::debug!(function = declaration.name(), "symbol resolved");
            println!("  ok       {}", declaration);
        } else {
            tracing::warn!(function = declaration.name(), "symbol not exported");
            println!("  missing  {}", declaration);
            missing.push(declaration.name());
        }
    }
    println!("{}", handle.cleanup());

    if !missing.is_empty() {
        bail!(
            "{} declared function(s) not exported: {}",
            missing.len(),
            missing.join(", ")
        );
    }
    Ok(())
}
