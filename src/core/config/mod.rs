//! core::config
//!
//! Workspace configuration.
//!
//! # Overview
//!
//! Configuration is resolved once at startup into an immutable
//! [`WorkspaceConfig`] that is passed to every component. Nothing below the
//! CLI layer reads the environment or the config file on its own.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. `workspace.toml` at the workspace root
//! 3. CLI flags (`-m/--main`)
//!
//! # Main Project
//!
//! When neither the CLI nor the file names the main project, the immediate
//! sub-directory of the root holding the largest lock file is used.
//!
//! # Example
//!
//! ```no_run
//! use pegboard::core::config::WorkspaceConfig;
//! use std::path::Path;
//!
//! let config = WorkspaceConfig::load(Path::new("/path/to/workspace"), None).unwrap();
//! println!("main project: {}", config.main());
//! println!("lock file: {}", config.lock_file_path().display());
//! ```

pub mod schema;

pub use schema::WorkspaceFile;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Name of the configuration file at the workspace root.
pub const CONFIG_FILE_NAME: &str = "workspace.toml";

const DEFAULT_DECLARATION_FILE: &str = "conanfile.py";
const DEFAULT_LOCK_FILE: &str = "conan.lock";
const DEFAULT_PACKAGE_MANAGER: &str = "conan";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("the main project could not be determined: no sub-directory of '{0}' has a lock file")]
    NoMainProject(PathBuf),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Immutable workspace configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    root: PathBuf,
    main: String,
    git_prefix: String,
    git_suffix: String,
    declaration_file: String,
    lock_file: String,
    editable_registry: PathBuf,
    package_manager: String,
}

impl WorkspaceConfig {
    /// Load configuration for the workspace rooted at `root`.
    ///
    /// `main_override` is the CLI `-m/--main` value and wins over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if `workspace.toml` exists but cannot be parsed, or
    /// if no main project can be determined.
    pub fn load(root: &Path, main_override: Option<&str>) -> Result<Self, ConfigError> {
        let file = Self::read_file(root)?;

        let editable_registry = match &file.editable_registry {
            Some(path) => path.clone(),
            None => default_editable_registry()?,
        };

        Self::resolve(root, file, main_override, editable_registry)
    }

    /// Build a configuration from an already parsed file.
    ///
    /// The registry location must be supplied explicitly when the file does
    /// not set one.
    pub fn resolve(
        root: &Path,
        file: WorkspaceFile,
        main_override: Option<&str>,
        editable_registry: PathBuf,
    ) -> Result<Self, ConfigError> {
        file.validate()?;
        let lock_file = file
            .lock_file
            .unwrap_or_else(|| DEFAULT_LOCK_FILE.to_string());

        let main = match (main_override, file.main) {
            (Some(main), _) => {
                schema::validate_file_name("main", main)?;
                main.to_string()
            }
            (None, Some(main)) => main,
            (None, None) => {
                let detected = detect_main(root, &lock_file)?;
                info!(main = %detected, "auto-detected main project from lock file size");
                detected
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            main,
            git_prefix: file.git_prefix.unwrap_or_default(),
            git_suffix: file.git_suffix.unwrap_or_default(),
            declaration_file: file
                .declaration_file
                .unwrap_or_else(|| DEFAULT_DECLARATION_FILE.to_string()),
            lock_file,
            editable_registry: file.editable_registry.unwrap_or(editable_registry),
            package_manager: file
                .package_manager
                .unwrap_or_else(|| DEFAULT_PACKAGE_MANAGER.to_string()),
        })
    }

    fn read_file(root: &Path) -> Result<WorkspaceFile, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(WorkspaceFile::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main(&self) -> &str {
        &self.main
    }

    /// Directory of a workspace member.
    pub fn package_directory(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Lock file of the main project.
    pub fn lock_file_path(&self) -> PathBuf {
        self.package_directory(&self.main).join(&self.lock_file)
    }

    /// Clone URL of a workspace member.
    pub fn clone_url(&self, name: &str) -> String {
        format!("{}{}{}", self.git_prefix, name, self.git_suffix)
    }

    pub fn declaration_file(&self) -> &str {
        &self.declaration_file
    }

    pub fn editable_registry(&self) -> &Path {
        &self.editable_registry
    }

    pub fn package_manager(&self) -> &str {
        &self.package_manager
    }
}

/// `~/.conan/editable_packages.json`
fn default_editable_registry() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".conan").join("editable_packages.json"))
}

/// Pick the sub-directory of `root` with the largest lock file.
fn detect_main(root: &Path, lock_file: &str) -> Result<String, ConfigError> {
    let entries = fs::read_dir(root).map_err(|e| ConfigError::ReadError {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut best: Option<(u64, String)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Ok(metadata) = fs::metadata(path.join(lock_file)) else {
            continue;
        };
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        let size = metadata.len();
        let better = match &best {
            None => true,
            // Ties resolve by name so detection is deterministic.
            Some((best_size, best_name)) => {
                size > *best_size || (size == *best_size && name < *best_name)
            }
        };
        if better {
            best = Some((size, name));
        }
    }

    best.map(|(_, name)| name)
        .ok_or_else(|| ConfigError::NoMainProject(root.to_path_buf()))
}
