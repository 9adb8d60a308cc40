//! Extract command - list contracts declared in native sources

use anyhow::Result;
use std::path::PathBuf;
use tether_contracts::{ContractExtractor, Markers};

pub struct ExtractArgs {
    pub files: Vec<PathBuf>,
    pub json: bool,
    pub markers: Markers,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let sources = super::read_sources(&args.files)?;
    let extraction = ContractExtractor::new(args.markers).extract(&sources);
    tracing::info!(
        files = sources.len(),
        declarations = extraction.declarations.len(),
        skipped = extraction.diagnostics.len(),
        "extracted contracts"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    for declaration in &extraction.declarations {
        println!("{}  [{}]", declaration, declaration.origin());
    }
    for diagnostic in &extraction.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    println!(
        "{} declaration(s), {} skipped, {} ignored",
        extraction.declarations.len(),
        extraction.diagnostics.len(),
        extraction.ignored
    );
    Ok(())
}
