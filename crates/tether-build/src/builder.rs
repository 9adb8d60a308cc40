//! Extract → generate → write pipeline
use crate::artifact::write_atomic;
use crate::error::{BuildError, BuildResult};
use crate::generator::{Generator, GeneratorOptions};

use std::path::{Path, PathBuf};
use tether_contracts::{ContractExtractor, Declaration, Diagnostic, Markers, SourceText};

#[derive(Debug, Clone)]
enum SourceInput {
    Path(PathBuf),
    Text(SourceText),
}

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Where the module was written
    pub output: PathBuf,
    /// Declarations that received a stub, in order
    pub declarations: Vec<Declaration>,
    /// Skipped contract blocks
    pub diagnostics: Vec<Diagnostic>,
    /// Blocks whose record type is not bound
    pub ignored: usize,
    /// False when the output already held identical text
    pub written: bool,
}

impl GenerationReport {
    /// Number of generated stubs
    pub fn generated(&self) -> usize {
        self.declarations.len()
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.declarations.iter().map(Declaration::name).collect()
    }
}

/// Builds a binding module from native sources
///
/// # Example
///
/// ```no_run
/// use tether_build::BindingsBuilder;
///
/// let report = BindingsBuilder::new("src/generated/bindings.rs")
///     .source("native/add.h")
///     .source("native/sub.h")
///     .struct_name("Arithmetic")
///     .generate()
///     .unwrap();
/// assert_eq!(report.function_names(), ["add", "sub"]);
/// ```
#[derive(Debug, Clone)]
pub struct BindingsBuilder {
    output: PathBuf,
    inputs: Vec<SourceInput>,
    markers: Markers,
    options: GeneratorOptions,
}

impl BindingsBuilder {
    /// Create a builder writing to `output`
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            inputs: Vec::new(),
            markers: Markers::default(),
            options: GeneratorOptions::default(),
        }
    }

    /// Add a native source file to scan
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(SourceInput::Path(path.into()));
        self
    }

    /// Add several native source files, in order
    pub fn sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs
            .extend(paths.into_iter().map(|p| SourceInput::Path(p.into())));
        self
    }

    /// Add an in-memory source text
    pub fn source_text(mut self, text: SourceText) -> Self {
        self.inputs.push(SourceInput::Text(text));
        self
    }

    pub fn markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    pub fn runtime_path(mut self, path: impl Into<String>) -> Self {
        self.options.runtime_path = path.into();
        self
    }

    pub fn struct_name(mut self, name: impl Into<String>) -> Self {
        self.options.struct_name = name.into();
        self
    }

    pub fn options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Files this builder reads, for change tracking
    pub fn source_paths(&self) -> impl Iterator<Item = &Path> {
        self.inputs.iter().filter_map(|input| match input {
            SourceInput::Path(path) => Some(path.as_path()),
            SourceInput::Text(_) => None,
        })
    }

    /// Run extraction and generation, then write the module
    pub fn generate(&self) -> BuildResult<GenerationReport> {
        self.markers.validate().map_err(BuildError::InvalidMarkers)?;
        self.options.validate()?;

        let texts = self.load_sources()?;
        let extraction = ContractExtractor::new(self.markers.clone()).extract(&texts);
        let module = Generator::new(self.options.clone()).render(&extraction.declarations)?;
        let written = write_atomic(&self.output, &module)?;

        tracing::info!(
            output = %self.output.display(),
            functions = extraction.declarations.len(),
            skipped = extraction.diagnostics.len(),
            written,
            "generated bindings"
        );

        Ok(GenerationReport {
            output: self.output.clone(),
            declarations: extraction.declarations,
            diagnostics: extraction.diagnostics,
            ignored: extraction.ignored,
            written,
        })
    }

    fn load_sources(&self) -> BuildResult<Vec<SourceText>> {
        self.inputs
            .iter()
            .map(|input| match input {
                SourceInput::Path(path) => {
                    SourceText::from_path(path).map_err(|e| BuildError::source_read(path, e))
                }
                SourceInput::Text(text) => Ok(text.clone()),
            })
            .collect()
    }
}
