//! Generate command - write a binding module

use anyhow::{Context, Result};
use std::path::PathBuf;
use tether_build::BindingsBuilder;
use tether_config::Config;
use tether_contracts::Markers;

pub struct GenerateArgs {
    pub files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub runtime_path: Option<String>,
    pub struct_name: Option<String>,
    pub markers: Markers,
}

pub fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let output = args
        .output
        .or_else(|| config.output())
        .context("No output path: pass --output or set [bindings].output in tether.toml")?;

    let mut builder = BindingsBuilder::new(output)
        .sources(args.files)
        .markers(args.markers);
    if let Some(runtime_path) = args
        .runtime_path
        .or_else(|| config.project.runtime_path().map(str::to_string))
    {
        builder = builder.runtime_path(runtime_path);
    }
    if let Some(struct_name) = args
        .struct_name
        .or_else(|| config.project.struct_name().map(str::to_string))
    {
        builder = builder.struct_name(struct_name);
    }

    let report = builder.generate().context("Binding generation failed")?;
    tracing::info!(
        output = %report.output.display(),
        functions = report.generated(),
        skipped = report.diagnostics.len(),
        written = report.written,
        "generated bindings"
    );

    for diagnostic in &report.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    let status = if report.written { "wrote" } else { "unchanged" };
    println!(
        "{} {} ({} function(s))",
        status,
        report.output.display(),
        report.generated()
    );
    Ok(())
}
