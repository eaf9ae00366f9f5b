//! manager::conan
//!
//! Conan command-line implementation of [`PackageManager`].

use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::traits::{ManagerError, PackageManager};
use crate::core::reference::PackageReference;

/// Runs the `conan` executable (or a configured replacement).
#[derive(Debug, Clone)]
pub struct Conan {
    program: String,
}

impl Conan {
    /// Use `program` as the conan executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<(), ManagerError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(%command, "running package manager");

        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| ManagerError::CommandFailed {
            command: command.clone(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ManagerError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Conan {
    fn default() -> Self {
        Self::new("conan")
    }
}

impl PackageManager for Conan {
    fn name(&self) -> &str {
        &self.program
    }

    fn install(&self, directory: &Path) -> Result<(), ManagerError> {
        self.run(Some(directory), &["install", "."])
    }

    fn editable_add(&self, path: &Path, reference: &PackageReference) -> Result<(), ManagerError> {
        let path = path.to_string_lossy();
        let reference = reference.to_string();
        self.run(None, &["editable", "add", &path, &reference])
    }

    fn editable_remove(&self, reference: &PackageReference) -> Result<(), ManagerError> {
        let reference = reference.to_string();
        self.run(None, &["editable", "remove", &reference])
    }
}
