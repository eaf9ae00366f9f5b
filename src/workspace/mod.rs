//! workspace
//!
//! The multi-repository workspace: every package named in the main
//! project's lock file, checked out side by side under one root.
//!
//! # Modules
//!
//! - [`package`] - Read-through view of one workspace member
//! - [`peg`] - Propagation of committed revisions into dependents
//! - [`branches`] - Most stable remote branch containing a commit
//!
//! # Consistency
//!
//! A workspace is consistent when every downloaded package
//! - is registered as an editable pointing at its own directory,
//! - has a checkout that contains its locked revision,
//! - declares the current revision of each editable dependency.
//!
//! [`Workspace::status`] reports the first two; [`Workspace::peg`]
//! restores the third.
//!
//! # Example
//!
//! ```ignore
//! use pegboard::core::config::WorkspaceConfig;
//! use pegboard::manager::Conan;
//! use pegboard::workspace::Workspace;
//!
//! let config = WorkspaceConfig::load(&root, None)?;
//! let mut workspace = Workspace::open(config, Conan::default())?;
//! let report = workspace.peg(Some("Use new net"))?;
//! ```

pub mod branches;
pub mod package;
pub mod peg;

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::WorkspaceConfig;
use crate::core::graph::{DependencyGraph, GraphError};
use crate::core::lockfile::{self, LockFileError, LockedReferences};
use crate::core::reference::PackageReference;
use crate::core::types::Oid;
use crate::git::{Git, GitError};
use crate::manager::{Editable, EditableRegistry, Editables, ManagerError, PackageManager};

pub use package::Package;
pub use peg::{PegReport, PeggedPackage};

/// Errors from workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    LockFile(#[from] LockFileError),

    #[error("the workspace does not have a package named '{0}'")]
    MissingPackage(String),

    #[error(transparent)]
    CyclicGraph(#[from] GraphError),

    /// Packages with uncommitted changes while no commit message was given.
    #[error("uncommitted changes in {}; commit them or pass a commit message", packages.join(", "))]
    DirtyWorkspace { packages: Vec<String> },

    /// Packages whose checkout no longer contains the locked revision.
    ///
    /// `dirty` lists the packages that would also have failed the
    /// uncommitted changes check.
    #[error(
        "checkout does not contain the locked revision in {}{}",
        packages.join(", "),
        also_dirty(dirty)
    )]
    InvalidRevision {
        packages: Vec<String>,
        dirty: Vec<String>,
    },

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    PackageManager(#[from] ManagerError),

    /// Two remote branches contain the commit but have diverged.
    #[error("remote branches '{first}' and '{second}' have diverged; no branch is most stable")]
    AmbiguousBranch { first: String, second: String },

    #[error("package '{0}' is not downloaded")]
    NotDownloaded(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot build the declaration pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn also_dirty(dirty: &[String]) -> String {
    if dirty.is_empty() {
        String::new()
    } else {
        format!("; uncommitted changes in {}", dirty.join(", "))
    }
}

/// Snapshot of one package, as reported by [`Workspace::status`].
#[derive(Debug, Clone)]
pub struct PackageStatus {
    pub name: String,
    pub directory: PathBuf,
    /// Reference in the lock file
    pub locked: PackageReference,
    pub downloaded: bool,
    /// Active editable, if any
    pub editable: Option<Editable>,
    /// Checkout state; `None` when not downloaded
    pub checkout: Option<CheckoutStatus>,
}

/// Version control state of a downloaded package.
#[derive(Debug, Clone)]
pub struct CheckoutStatus {
    pub revision: Oid,
    pub sequence_in_branch: u64,
    /// `None` when HEAD is detached
    pub branch: Option<String>,
    pub dirty: bool,
    /// Whether HEAD contains the locked revision
    pub contains_locked: bool,
}

impl PackageStatus {
    /// Whether the package satisfies the workspace consistency rules that
    /// can be checked without a peg.
    pub fn is_consistent(&self) -> bool {
        if !self.downloaded {
            return true;
        }
        let editable_here = self
            .editable
            .as_ref()
            .is_some_and(|editable| editable.path == self.directory);
        let contains = self
            .checkout
            .as_ref()
            .is_some_and(|checkout| checkout.contains_locked);
        editable_here && contains
    }
}

/// A workspace rooted at a directory, bound to a package manager.
#[derive(Debug)]
pub struct Workspace<M: PackageManager> {
    config: WorkspaceConfig,
    manager: M,
    graph: DependencyGraph,
    locked: LockedReferences,
}

impl<M: PackageManager> Workspace<M> {
    /// Read the main project's lock file and build the workspace.
    ///
    /// # Errors
    ///
    /// Fails if the lock file cannot be read or describes a cyclic graph.
    pub fn open(config: WorkspaceConfig, manager: M) -> Result<Self, WorkspaceError> {
        let (graph, locked) = read_graph(&config)?;
        info!(
            main = config.main(),
            packages = graph.len(),
            "opened workspace"
        );
        Ok(Self {
            config,
            manager,
            graph,
            locked,
        })
    }

    /// Rebuild the graph and locked references from the lock file.
    pub fn reload(&mut self) -> Result<(), WorkspaceError> {
        let (graph, locked) = read_graph(&self.config)?;
        self.graph = graph;
        self.locked = locked;
        Ok(())
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn locked_references(&self) -> &LockedReferences {
        &self.locked
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.graph.contains(name)
    }

    /// View of the named package.
    pub fn package(&self, name: &str) -> Result<Package<'_, M>, WorkspaceError> {
        let (name, locked) = self
            .locked
            .get_key_value(name)
            .ok_or_else(|| WorkspaceError::MissingPackage(name.to_string()))?;
        Ok(Package::new(self, name, locked))
    }

    /// Every package, dependents first.
    pub fn packages(&self) -> Result<Vec<Package<'_, M>>, WorkspaceError> {
        self.topological_order()?
            .iter()
            .map(|name| self.package(name))
            .collect()
    }

    /// Package names such that each precedes its dependencies.
    pub fn topological_order(&self) -> Result<Vec<String>, WorkspaceError> {
        Ok(self.graph.topological_order()?)
    }

    /// Package names such that each follows its dependencies.
    pub fn reverse_order(&self) -> Result<Vec<String>, WorkspaceError> {
        Ok(self.graph.reverse_order()?)
    }

    pub(crate) fn registry(&self) -> EditableRegistry<'_> {
        EditableRegistry::new(self.config.editable_registry(), &self.manager)
    }

    /// Active editables, read fresh from the package manager's table.
    pub fn editables(&self) -> Result<Editables, WorkspaceError> {
        Ok(self.registry().load(&self.locked)?)
    }

    /// Current state of every package, dependents first.
    ///
    /// Runs no mutating command.
    pub fn status(&self) -> Result<Vec<PackageStatus>, WorkspaceError> {
        let mut editables = self.editables()?;
        let mut result = Vec::new();

        for package in self.packages()? {
            let downloaded = package.is_downloaded();
            let checkout = if downloaded {
                let git = package.git()?;
                Some(CheckoutStatus {
                    revision: git.current_revision()?,
                    sequence_in_branch: git.sequence_in_branch()?,
                    branch: git.current_branch()?,
                    dirty: git.is_dirty()?,
                    contains_locked: git.contains(package.locked_reference().revision())?,
                })
            } else {
                None
            };

            result.push(PackageStatus {
                name: package.name().to_string(),
                directory: package.directory(),
                locked: package.locked_reference().clone(),
                downloaded,
                editable: editables.remove(package.name()),
                checkout,
            });
        }

        Ok(result)
    }

    /// Register editables for the named packages, or for every downloaded
    /// package when `names` is empty.
    ///
    /// The editable is registered under the locked reference, or under the
    /// checkout's actual sequence and revision when `actual` is set.
    pub fn edit(&self, names: &[String], actual: bool) -> Result<(), WorkspaceError> {
        let editables = self.editables()?;
        let registry = self.registry();

        for name in self.select(names, true)? {
            let package = self.package(&name)?;
            let reference = if actual {
                let git = package.git()?;
                package
                    .locked_reference()
                    .with_revision(git.sequence_in_branch()?, git.current_revision()?.as_str())
            } else {
                package.locked_reference().clone()
            };
            let wanted = Editable::new(reference, package.directory());

            if let Some(current) = editables.get(&name) {
                if current.package_reference == wanted.package_reference
                    && current.path == wanted.path
                {
                    debug!(package = %name, "editable already registered");
                    continue;
                }
                registry.remove(current)?;
            }
            registry.add(&wanted)?;
        }

        Ok(())
    }

    /// Disable the editables of the named packages, or every editable of
    /// the workspace when `names` is empty.
    pub fn close(&self, names: &[String]) -> Result<Vec<String>, WorkspaceError> {
        let editables = self.editables()?;
        let registry = self.registry();
        let mut closed = Vec::new();

        for name in names {
            if !self.has_package(name) {
                return Err(WorkspaceError::MissingPackage(name.clone()));
            }
        }

        for (name, editable) in &editables {
            if names.is_empty() || names.contains(name) {
                registry.remove(editable)?;
                closed.push(name.clone());
            }
        }

        Ok(closed)
    }

    /// Clone a package next to the others, check out its locked revision
    /// and make it editable.
    ///
    /// Returns `false` if the package was already downloaded.
    pub fn download(&self, name: &str) -> Result<bool, WorkspaceError> {
        let package = self.package(name)?;
        if package.is_downloaded() {
            debug!(package = name, "already downloaded");
            return Ok(false);
        }

        let url = self.config.clone_url(name);
        info!(package = name, %url, "cloning");
        let git = Git::clone_into(&url, self.config.root(), name)?;
        git.checkout(package.locked_reference().revision())?;

        self.edit(&[name.to_string()], false)?;
        Ok(true)
    }

    /// Push the current branch of the named packages.
    pub fn push(&self, names: &[String]) -> Result<(), WorkspaceError> {
        for name in names {
            let package = self.package(name)?;
            info!(package = %name, "pushing");
            package.git()?.push()?;
        }
        Ok(())
    }

    /// Names of the packages an operation applies to, dependencies first.
    /// An empty selection means every package.
    fn select(&self, names: &[String], downloaded_only: bool) -> Result<Vec<String>, WorkspaceError> {
        let requested: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        for name in &requested {
            let package = self.package(name)?;
            if downloaded_only && !package.is_downloaded() {
                return Err(WorkspaceError::NotDownloaded(name.to_string()));
            }
        }

        let mut selected = Vec::new();
        for name in self.reverse_order()? {
            let chosen = if requested.is_empty() {
                !downloaded_only || self.package(&name)?.is_downloaded()
            } else {
                requested.contains(name.as_str())
            };
            if chosen {
                selected.push(name);
            }
        }
        Ok(selected)
    }
}

fn read_graph(config: &WorkspaceConfig) -> Result<(DependencyGraph, LockedReferences), WorkspaceError> {
    let (graph, locked) = lockfile::read(&config.lock_file_path())?;
    // Surface cycles when the workspace is opened rather than mid-operation.
    graph.topological_order()?;
    Ok((graph, locked))
}
