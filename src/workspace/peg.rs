//! workspace::peg
//!
//! Pegging: commit every editable package and make each dependent declare
//! the revisions its editable dependencies are actually at.
//!
//! # Algorithm
//!
//! 1. Snapshot the downloaded and editable packages. The snapshot alone
//!    decides what is processed and installed, even if registrations
//!    change along the way.
//! 2. Preflight with no mutation: every package must contain its locked
//!    revision and, without a commit message, be clean. All violations
//!    are reported together.
//! 3. Walk the snapshot dependencies first. Commit the package, re-register
//!    its editable under the new revision, then rewrite the matching
//!    reference in the declaration file of every editable ancestor.
//! 4. Run the package manager's install once per package, same order.
//! 5. Rebuild the graph from the lock file.
//!
//! A dependency is always committed before its dependents are visited, so
//! a rewritten declaration is picked up by the dependent's own commit.
//!
//! Steps 3 and 4 are not transactional. A failure leaves the packages
//! already committed and the declarations already rewritten as they are.
//!
//! # Rewriting
//!
//! Every occurrence of `name/<version>.<sequence>.<revision>` in an
//! ancestor's declaration file is replaced, whether the ancestor requires
//! the package directly or not. Only full 40 or 64 digit hexadecimal
//! revisions are recognized, and the name must not be the tail of a longer
//! identifier.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::{debug, info};

use super::{Workspace, WorkspaceError};
use crate::core::reference::PackageReference;
use crate::manager::{Editable, PackageManager};

/// Commit message used when the caller supplies none.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Peg dependency revisions";

/// What a peg did to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeggedPackage {
    pub name: String,
    /// Reference in the lock file before the peg
    pub previous: PackageReference,
    /// Reference the editable is now registered under
    pub reference: PackageReference,
    /// Whether a commit was created
    pub committed: bool,
    /// Ancestors whose declaration file was rewritten
    pub rewritten: Vec<String>,
    pub installed: bool,
}

/// Outcome of [`Workspace::peg`], dependencies first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PegReport {
    pub packages: Vec<PeggedPackage>,
}

impl PegReport {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Names of the pegged packages.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|p| p.name.as_str())
    }

    /// Names of the packages that received a new commit.
    pub fn committed(&self) -> impl Iterator<Item = &str> {
        self.packages
            .iter()
            .filter(|p| p.committed)
            .map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&PeggedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }
}

impl<M: PackageManager> Workspace<M> {
    /// Propagate the current revision of every editable package into the
    /// declarations of its editable dependents.
    ///
    /// Dirty packages are committed with `message`. Without a message every
    /// editable package must be clean.
    ///
    /// # Errors
    ///
    /// - [`WorkspaceError::InvalidRevision`] (also naming any dirty packages)
    ///   or [`WorkspaceError::DirtyWorkspace`] from the preflight, before
    ///   anything is changed
    /// - any git, package manager or I/O error from the propagation
    pub fn peg(&mut self, message: Option<&str>) -> Result<PegReport, WorkspaceError> {
        let editables = self.editables()?;
        let mut snapshot = Vec::new();
        for name in self.reverse_order()? {
            if editables.contains_key(&name) && self.package(&name)?.is_downloaded() {
                snapshot.push(name);
            }
        }
        debug!(packages = ?snapshot, "peg snapshot");

        self.preflight(&snapshot, message)?;

        let message = message.unwrap_or(DEFAULT_COMMIT_MESSAGE);
        let members: BTreeSet<&str> = snapshot.iter().map(String::as_str).collect();
        let registry = self.registry();
        let mut report = PegReport::default();

        for name in &snapshot {
            let package = self.package(name)?;
            let git = package.git()?;

            let before = git.current_revision()?;
            let revision = git.commit_if_dirty(self.config().declaration_file(), message)?;
            let sequence = git.sequence_in_branch()?;
            let committed = revision != before;
            if committed {
                info!(package = %name, revision = %revision.short(10), "committed");
            }

            let reference = package
                .locked_reference()
                .with_revision(sequence, revision.as_str());
            let wanted = Editable::new(reference.clone(), package.directory());
            match editables.get(name) {
                Some(current)
                    if current.package_reference == wanted.package_reference
                        && current.path == wanted.path =>
                {
                    debug!(package = %name, "editable unchanged");
                }
                current => {
                    if let Some(current) = current {
                        registry.remove(current)?;
                    }
                    registry.add(&wanted)?;
                }
            }

            let mut rewritten = Vec::new();
            for ancestor in self.graph().ancestors(name) {
                if !members.contains(ancestor.as_str()) {
                    continue;
                }
                let path = self.package(&ancestor)?.declaration_path();
                if rewrite_declaration(&path, &reference)? {
                    info!(package = %name, dependent = %ancestor, "updated requirement");
                    rewritten.push(ancestor);
                }
            }

            report.packages.push(PeggedPackage {
                name: name.clone(),
                previous: package.locked_reference().clone(),
                reference,
                committed,
                rewritten,
                installed: false,
            });
        }

        // Once per package, after every declaration is final.
        for pegged in &mut report.packages {
            let directory = self.config().package_directory(&pegged.name);
            debug!(package = %pegged.name, "installing");
            self.manager().install(&directory)?;
            pegged.installed = true;
        }

        self.reload()?;
        Ok(report)
    }

    fn preflight(&self, snapshot: &[String], message: Option<&str>) -> Result<(), WorkspaceError> {
        let mut invalid = Vec::new();
        let mut dirty = Vec::new();

        for name in snapshot {
            let package = self.package(name)?;
            let git = package.git()?;
            if !git.contains(package.locked_reference().revision())? {
                invalid.push(name.clone());
            }
            if message.is_none() && git.is_dirty()? {
                dirty.push(name.clone());
            }
        }

        if !invalid.is_empty() {
            return Err(WorkspaceError::InvalidRevision {
                packages: invalid,
                dirty,
            });
        }
        if !dirty.is_empty() {
            return Err(WorkspaceError::DirtyWorkspace { packages: dirty });
        }
        Ok(())
    }
}

/// Rewrite the references to `reference`'s package in the file at `path`.
///
/// The file is only written when its content changes. Returns whether it
/// was written. A missing file is left alone.
pub fn rewrite_declaration(path: &Path, reference: &PackageReference) -> Result<bool, WorkspaceError> {
    if !path.exists() {
        debug!(path = %path.display(), "no declaration file");
        return Ok(false);
    }

    let contents = fs::read_to_string(path)?;
    match rewrite_references(&contents, reference)? {
        Cow::Borrowed(_) => Ok(false),
        Cow::Owned(updated) if updated == contents => Ok(false),
        Cow::Owned(updated) => {
            fs::write(path, updated)?;
            Ok(true)
        }
    }
}

/// Replace every `name/<version>.<sequence>.<revision>` of `reference`'s
/// package in `text` with `reference`'s own version, sequence and
/// revision.
pub fn rewrite_references<'t>(
    text: &'t str,
    reference: &PackageReference,
) -> Result<Cow<'t, str>, WorkspaceError> {
    let pattern = format!(
        r"(^|[^\w.+-]){}/[\w.+-]+?\.\d+\.(?:[0-9a-f]{{64}}|[0-9a-f]{{40}})\b",
        regex::escape(reference.name())
    );
    // The name is escaped; only the size limit can reject the pattern.
    let regex = Regex::new(&pattern)?;

    let replacement = format!("{}/{}", reference.name(), reference.version_triple());
    Ok(regex.replace_all(text, |caps: &Captures| {
        format!("{}{}", &caps[1], replacement)
    }))
}
