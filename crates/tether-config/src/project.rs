//! Project Configuration (tether.toml)
//!
//! ```toml
//! [bindings]
//! sources = ["native/int_vector.hpp"]
//! output = "src/generated/int_vector.rs"
//! runtime_path = "::tether_runtime"
//! struct_name = "IntVectorBindings"
//!
//! [markers]
//! begin = "[export]"
//! end = "[endexport]"
//!
//! [library]
//! base = "build/libint_vector"
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tether_contracts::{is_identifier, Markers};

/// Project configuration from tether.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Binding generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<BindingsConfig>,

    /// Annotation markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers: Option<MarkersConfig>,

    /// Native artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryConfig>,
}

/// Binding generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BindingsConfig {
    /// Annotated sources, in the order declarations are emitted
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<PathBuf>,

    /// Generated module path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Path the generated module uses to name the runtime crate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_path: Option<String>,

    /// Name of the generated binding set struct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub struct_name: Option<String>,
}

/// Annotation marker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MarkersConfig {
    pub begin: String,
    pub end: String,
}

/// Native artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Platform-neutral base path; `.so` and `.dll` are appended when loading
    pub base: PathBuf,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(path, &content)
    }

    /// Parse configuration text; `path` is used in errors
    pub fn parse(path: &Path, content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(bindings) = &self.bindings {
            for source in &bindings.sources {
                if source.as_os_str().is_empty() {
                    return Err(ConfigError::invalid_value(
                        "bindings.sources",
                        "source path cannot be empty",
                    ));
                }
            }

            if let Some(output) = &bindings.output {
                if output.file_name().is_none() {
                    return Err(ConfigError::InvalidPath(output.clone()));
                }
            }

            if let Some(runtime_path) = &bindings.runtime_path {
                if !is_runtime_path(runtime_path) {
                    return Err(ConfigError::invalid_value(
                        "bindings.runtime_path",
                        format!("'{}' is not a Rust path", runtime_path),
                    ));
                }
            }

            if let Some(struct_name) = &bindings.struct_name {
                if !is_identifier(struct_name) {
                    return Err(ConfigError::invalid_value(
                        "bindings.struct_name",
                        format!("'{}' is not an identifier", struct_name),
                    ));
                }
            }
        }

        if let Some(markers) = &self.markers {
            markers
                .to_markers()
                .validate()
                .map_err(|reason| ConfigError::invalid_value("markers", reason))?;
        }

        if let Some(library) = &self.library {
            if library.base.as_os_str().is_empty() {
                return Err(ConfigError::invalid_value(
                    "library.base",
                    "base path cannot be empty",
                ));
            }
        }

        Ok(())
    }

    /// Configured sources, as written
    pub fn sources(&self) -> &[PathBuf] {
        self.bindings
            .as_ref()
            .map(|b| b.sources.as_slice())
            .unwrap_or(&[])
    }

    pub fn output(&self) -> Option<&Path> {
        self.bindings.as_ref().and_then(|b| b.output.as_deref())
    }

    pub fn runtime_path(&self) -> Option<&str> {
        self.bindings.as_ref().and_then(|b| b.runtime_path.as_deref())
    }

    pub fn struct_name(&self) -> Option<&str> {
        self.bindings.as_ref().and_then(|b| b.struct_name.as_deref())
    }

    /// Configured markers, or the defaults
    pub fn markers(&self) -> Markers {
        self.markers
            .as_ref()
            .map(MarkersConfig::to_markers)
            .unwrap_or_default()
    }

    pub fn library_base(&self) -> Option<&Path> {
        self.library.as_ref().map(|l| l.base.as_path())
    }

    fn bindings_mut(&mut self) -> &mut BindingsConfig {
        self.bindings.get_or_insert_with(BindingsConfig::default)
    }

    pub(crate) fn set_output(&mut self, output: PathBuf) {
        self.bindings_mut().output = Some(output);
    }

    pub(crate) fn set_runtime_path(&mut self, runtime_path: String) {
        self.bindings_mut().runtime_path = Some(runtime_path);
    }

    pub(crate) fn set_library_base(&mut self, base: PathBuf) {
        self.library = Some(LibraryConfig { base });
    }
}

impl MarkersConfig {
    pub fn to_markers(&self) -> Markers {
        Markers::new(self.begin.clone(), self.end.clone())
    }
}

/// `::`-separated identifiers or path keywords, optionally rooted with `::`
fn is_runtime_path(path: &str) -> bool {
    let path = path.strip_prefix("::").unwrap_or(path);
    !path.is_empty()
        && path
            .split("::")
            .all(|segment| matches!(segment, "crate" | "self" | "super") || is_identifier(segment))
}
