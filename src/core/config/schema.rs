//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! `workspace.toml` at the workspace root. Every field is optional.
//!
//! # Validation
//!
//! Values are validated after parsing: names must be plain file or directory
//! names and strings must be non-empty where they are used as paths.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of `workspace.toml`.
///
/// # Example
///
/// ```toml
/// main = "app"
/// git_prefix = "git@git.example.com:platform/"
/// git_suffix = ".git"
/// declaration_file = "conanfile.py"
/// lock_file = "conan.lock"
/// editable_registry = "/home/me/.conan/editable_packages.json"
/// package_manager = "conan"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceFile {
    /// Root project whose lock file describes the workspace
    pub main: Option<String>,

    /// Prepended to a package name to form its clone URL
    pub git_prefix: Option<String>,

    /// Appended to a package name to form its clone URL
    pub git_suffix: Option<String>,

    /// Per-package file holding dependency declarations
    pub declaration_file: Option<String>,

    /// Lock file name inside the root project
    pub lock_file: Option<String>,

    /// Editable override table persisted by the package manager
    pub editable_registry: Option<PathBuf>,

    /// Package manager executable
    pub package_manager: Option<String>,
}

impl WorkspaceFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(main) = &self.main {
            validate_file_name("main", main)?;
        }
        if let Some(file) = &self.declaration_file {
            validate_file_name("declaration_file", file)?;
        }
        if let Some(file) = &self.lock_file {
            validate_file_name("lock_file", file)?;
        }
        if let Some(pm) = &self.package_manager {
            if pm.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "package_manager cannot be empty".to_string(),
                ));
            }
        }
        if let Some(path) = &self.editable_registry {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "editable_registry cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Check that `value` is a single path component.
pub(crate) fn validate_file_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be a plain name, got '{}'",
            field, value
        )));
    }
    Ok(())
}
