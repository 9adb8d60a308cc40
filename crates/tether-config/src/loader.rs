//! Configuration Loader
//!
//! Finds `tether.toml` and applies environment overrides on top of it:
//! 1. Project config (tether.toml) - lowest priority
//! 2. Environment variables (TETHER_*) - overrides project
//! 3. CLI flags - highest priority (handled by caller)

use crate::project::ProjectConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "tether.toml";

const ENV_OUTPUT: &str = "TETHER_OUTPUT";
const ENV_LIBRARY: &str = "TETHER_LIBRARY";
const ENV_RUNTIME_PATH: &str = "TETHER_RUNTIME_PATH";

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip `TETHER_*` overrides
    ignore_env: bool,
}

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration, overrides applied
    pub project: ProjectConfig,

    /// Directory containing tether.toml
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not read `TETHER_*` environment variables
    pub fn ignore_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tether.toml. Without one, the
    /// default (empty) configuration is used.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = match find_config_file(start_dir) {
            Some(path) => {
                let project = ProjectConfig::load_from_file(&path)?;
                (path.parent().map(Path::to_path_buf), project)
            }
            None => (None, ProjectConfig::default()),
        };

        Ok(Config {
            project: self.apply_env_overrides(project)?,
            project_root,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: self.apply_env_overrides(project)?,
            project_root,
        })
    }

    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if self.ignore_env {
            return Ok(config);
        }

        if let Some(output) = env::var_os(ENV_OUTPUT) {
            config.set_output(PathBuf::from(output));
        }

        if let Some(base) = env::var_os(ENV_LIBRARY) {
            config.set_library_base(PathBuf::from(base));
        }

        if let Ok(runtime_path) = env::var(ENV_RUNTIME_PATH) {
            config.set_runtime_path(runtime_path);
        }

        // Overrides go through the same checks as the file
        config.validate()?;
        Ok(config)
    }
}

/// Nearest tether.toml at or above `start_dir`
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has tether.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Configured sources, resolved
    pub fn sources(&self) -> Vec<PathBuf> {
        self.project
            .sources()
            .iter()
            .map(|source| self.resolve(source))
            .collect()
    }

    /// Generated module path, resolved
    pub fn output(&self) -> Option<PathBuf> {
        self.project.output().map(|output| self.resolve(output))
    }

    /// Native artifact base path, resolved
    pub fn library_base(&self) -> Option<PathBuf> {
        self.project.library_base().map(|base| self.resolve(base))
    }

    /// Output path, or an error naming the missing setting
    pub fn require_output(&self) -> ConfigResult<PathBuf> {
        self.output().ok_or_else(|| {
            ConfigError::invalid_value("bindings.output", "no output path configured")
        })
    }
}
