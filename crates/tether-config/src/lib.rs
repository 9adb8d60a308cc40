//! tether Configuration
//!
//! Project configuration lives in `tether.toml`, found by walking up from the
//! working directory. It names the annotated sources to bind, where the
//! generated module goes, the annotation markers and the native artifact to
//! probe.
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Project config (`tether.toml`)
//! 2. Environment variables (`TETHER_OUTPUT`, `TETHER_LIBRARY`, `TETHER_RUNTIME_PATH`)
//! 3. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use tether_config::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! for source in config.sources() {
//!     println!("{}", source.display());
//! }
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

impl ConfigError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{find_config_file, Config, ConfigLoader, CONFIG_FILE_NAME};
pub use project::{BindingsConfig, LibraryConfig, MarkersConfig, ProjectConfig};
