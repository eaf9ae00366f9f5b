//! manager::traits
//!
//! Package manager trait definition.
//!
//! # Design
//!
//! The package manager is an external program. The workspace only needs
//! three of its commands: install a package's dependencies, and add or
//! remove an editable override. Everything else it does (resolution,
//! builds, the lock file format) stays on its side of this seam.
//!
//! # Example
//!
//! ```ignore
//! use pegboard::manager::PackageManager;
//!
//! fn reinstall(manager: &dyn PackageManager, dirs: &[std::path::PathBuf]) -> Result<(), ManagerError> {
//!     for dir in dirs {
//!         manager.install(dir)?;
//!     }
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::reference::PackageReference;

/// Errors from package manager operations.
#[derive(Debug, Clone, Error)]
pub enum ManagerError {
    /// A package manager command exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Captured standard error
        stderr: String,
    },

    /// The editable registry could not be read.
    #[error("editable registry error at '{path}': {message}")]
    Registry {
        /// Registry file
        path: PathBuf,
        /// What went wrong
        message: String,
    },
}

/// Commands the workspace issues to the package manager.
pub trait PackageManager {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    /// Install the dependencies of the package checked out in `directory`.
    fn install(&self, directory: &Path) -> Result<(), ManagerError>;

    /// Register `path` as the editable override for `reference`.
    fn editable_add(&self, path: &Path, reference: &PackageReference) -> Result<(), ManagerError>;

    /// Remove the editable override registered under `reference`.
    fn editable_remove(&self, reference: &PackageReference) -> Result<(), ManagerError>;
}
