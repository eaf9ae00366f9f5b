//! workspace::package
//!
//! Read-through view of one workspace member. Nothing here is cached:
//! every query goes back to the filesystem, the checkout or the registry.

use std::path::PathBuf;

use super::branches;
use super::{Workspace, WorkspaceError};
use crate::core::reference::PackageReference;
use crate::core::types::Oid;
use crate::git::Git;
use crate::manager::{Editable, PackageManager};

/// A workspace member.
#[derive(Debug)]
pub struct Package<'a, M: PackageManager> {
    workspace: &'a Workspace<M>,
    name: &'a str,
    locked: &'a PackageReference,
}

impl<'a, M: PackageManager> Package<'a, M> {
    pub(super) fn new(
        workspace: &'a Workspace<M>,
        name: &'a str,
        locked: &'a PackageReference,
    ) -> Self {
        Self {
            workspace,
            name,
            locked,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Checkout directory, whether or not it exists yet.
    pub fn directory(&self) -> PathBuf {
        self.workspace.config().package_directory(self.name)
    }

    /// Path of the dependency declaration file.
    pub fn declaration_path(&self) -> PathBuf {
        self.directory()
            .join(self.workspace.config().declaration_file())
    }

    /// Reference recorded for this package in the lock file.
    pub fn locked_reference(&self) -> &'a PackageReference {
        self.locked
    }

    /// Direct dependencies, sorted by name.
    pub fn dependencies(&self) -> Vec<&'a str> {
        self.workspace.graph().dependencies(self.name)
    }

    /// Whether the package has been checked out.
    pub fn is_downloaded(&self) -> bool {
        self.directory().join(".git").exists()
    }

    /// Open the package's checkout.
    pub fn git(&self) -> Result<Git, WorkspaceError> {
        if !self.is_downloaded() {
            return Err(WorkspaceError::NotDownloaded(self.name.to_string()));
        }
        Ok(Git::open(&self.directory())?)
    }

    /// The active editable, if registered.
    pub fn editable(&self) -> Result<Option<Editable>, WorkspaceError> {
        Ok(self.workspace.editables()?.remove(self.name))
    }

    pub fn is_editable(&self) -> Result<bool, WorkspaceError> {
        Ok(self.editable()?.is_some())
    }

    /// The most integrated remote branch containing the checkout's HEAD.
    pub fn most_stable_branch(&self) -> Result<Option<(String, Oid)>, WorkspaceError> {
        let git = self.git()?;
        let head = git.current_revision()?;
        branches::most_stable_branch_containing(&git, head.as_str())
    }
}
