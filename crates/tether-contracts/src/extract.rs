//! Contract extraction from annotated native source
//!
//! Native sources carry their binding contracts in comments, wrapped in a pair
//! of delimiter markers:
//!
//! ```text
//! /* [export] { "type": "function", "name": "add",
//!              "args": ["int a", "int b"], "return_type": "int" } [endexport] */
//! ```
//!
//! Extraction is two-staged: `ContractExtractor::blocks` lazily finds raw
//! blocks between matched markers, and `parse_block` turns one block into a
//! `Declaration`. Blocks that fail to parse are skipped with a diagnostic.

use crate::declaration::{Declaration, Origin, Param};
use crate::error::{ContractParseError, ContractResult};
use crate::types::TypeTag;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Record type accepted for binding
pub const FUNCTION_RECORD: &str = "function";

/// Delimiter pair wrapping an annotated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub begin: String,
    pub end: String,
}

impl Markers {
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// Check that the markers can delimit anything
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.begin.is_empty() || self.end.is_empty() {
            return Err("markers cannot be empty");
        }
        if self.begin == self.end {
            return Err("begin and end markers must differ");
        }
        Ok(())
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new("[export]", "[endexport]")
    }
}

/// One native source text, labelled for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    label: String,
    contents: String,
}

impl SourceText {
    pub fn new(label: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            contents: contents.into(),
        }
    }

    /// Read a source file; the label is the path as given
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), contents))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// Text found between one matched marker pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock<'a> {
    pub origin: Origin,
    pub body: &'a str,
}

/// Lazy iterator over raw blocks, file by file in the order supplied
///
/// Cloning the iterator (or calling `ContractExtractor::blocks` again) restarts
/// the scan without re-reading anything.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    markers: &'a Markers,
    sources: &'a [SourceText],
    file: usize,
    offset: usize,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = RawBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(source) = self.sources.get(self.file) {
            match find_block(source.contents(), self.offset, self.markers) {
                Some(found) => {
                    self.offset = found.resume_at;
                    return Some(RawBlock {
                        origin: Origin::new(source.label(), found.line),
                        body: found.body,
                    });
                }
                None => {
                    self.file += 1;
                    self.offset = 0;
                }
            }
        }
        None
    }
}

struct FoundBlock<'a> {
    body: &'a str,
    line: usize,
    resume_at: usize,
}

/// Find the next matched marker pair at or after `offset`
///
/// A begin marker without a later end marker matches nothing; when two begin
/// markers precede one end marker, the inner one wins.
fn find_block<'a>(text: &'a str, offset: usize, markers: &Markers) -> Option<FoundBlock<'a>> {
    let rest = text.get(offset..)?;
    let mut begin_at = offset + rest.find(&markers.begin)?;
    let mut body_start = begin_at + markers.begin.len();
    let end_at = body_start + text[body_start..].find(&markers.end)?;

    if let Some(inner) = text[body_start..end_at].rfind(&markers.begin) {
        begin_at = body_start + inner;
        body_start = begin_at + markers.begin.len();
    }

    Some(FoundBlock {
        body: &text[body_start..end_at],
        line: text[..begin_at].matches('\n').count() + 1,
        resume_at: end_at + markers.end.len(),
    })
}

/// A skipped block and why it was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub origin: Origin,
    pub message: String,
    #[serde(skip)]
    pub error: ContractParseError,
}

impl Diagnostic {
    pub fn new(origin: Origin, error: ContractParseError) -> Self {
        Self {
            origin,
            message: error.to_string(),
            error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: skipped contract: {}", self.origin, self.message)
    }
}

/// Result of extracting every block from a set of sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Valid function declarations in encounter order
    pub declarations: Vec<Declaration>,
    /// One entry per skipped block
    pub diagnostics: Vec<Diagnostic>,
    /// Well-formed blocks whose record type is not bound
    pub ignored: usize,
}

/// Scans native sources for annotated declarations
#[derive(Debug, Clone, Default)]
pub struct ContractExtractor {
    markers: Markers,
}

impl ContractExtractor {
    pub fn new(markers: Markers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Raw blocks across `sources`, in file order then source order
    pub fn blocks<'a>(&'a self, sources: &'a [SourceText]) -> Blocks<'a> {
        Blocks {
            markers: &self.markers,
            sources,
            file: 0,
            offset: 0,
        }
    }

    /// Parse every block, skipping the ones that fail
    pub fn extract(&self, sources: &[SourceText]) -> Extraction {
        let mut extraction = Extraction::default();
        let mut first_seen: HashMap<String, Origin> = HashMap::new();

        for block in self.blocks(sources) {
            let origin = block.origin.clone();
            let parsed = parse_block(&block).and_then(|decl| match decl {
                Some(decl) => match first_seen.get(decl.name()) {
                    Some(first) => Err(ContractParseError::DuplicateFunction {
                        name: decl.name().to_string(),
                        first: first.clone(),
                    }),
                    None => Ok(Some(decl)),
                },
                None => Ok(None),
            });

            match parsed {
                Ok(Some(decl)) => {
                    tracing::debug!(origin = %origin, signature = %decl, "extracted contract");
                    first_seen.insert(decl.name().to_string(), origin);
                    extraction.declarations.push(decl);
                }
                Ok(None) => {
                    tracing::debug!(origin = %origin, "ignoring non-function contract");
                    extraction.ignored += 1;
                }
                Err(error) => {
                    tracing::warn!(origin = %origin, %error, "skipping contract");
                    extraction.diagnostics.push(Diagnostic::new(origin, error));
                }
            }
        }

        extraction
    }
}

/// Parse one raw block
///
/// Returns `Ok(None)` for a well-formed record whose `type` is not `"function"`.
pub fn parse_block(block: &RawBlock<'_>) -> ContractResult<Option<Declaration>> {
    let value: Value = serde_json::from_str(block.body.trim())
        .map_err(|e| ContractParseError::InvalidRecord(e.to_string()))?;
    let record = value
        .as_object()
        .ok_or_else(|| ContractParseError::InvalidRecord("expected a JSON object".to_string()))?;

    if required_str(record, "type")? != FUNCTION_RECORD {
        return Ok(None);
    }

    let name = required_str(record, "name")?;
    let args = record
        .get("args")
        .ok_or_else(|| ContractParseError::missing("args"))?
        .as_array()
        .ok_or(ContractParseError::WrongFieldType {
            field: "args",
            expected: "a list of strings",
        })?;
    let return_type = required_str(record, "return_type")?;

    let params = args
        .iter()
        .map(|arg| {
            arg.as_str()
                .ok_or(ContractParseError::WrongFieldType {
                    field: "args",
                    expected: "a list of strings",
                })
                .and_then(Param::parse)
        })
        .collect::<ContractResult<Vec<_>>>()?;

    Declaration::new(
        name,
        params,
        TypeTag::parse(return_type),
        block.origin.clone(),
    )
    .map(Some)
}

fn required_str<'v>(record: &'v Map<String, Value>, field: &'static str) -> ContractResult<&'v str> {
    record
        .get(field)
        .ok_or_else(|| ContractParseError::missing(field))?
        .as_str()
        .ok_or(ContractParseError::WrongFieldType {
            field,
            expected: "a string",
        })
}
