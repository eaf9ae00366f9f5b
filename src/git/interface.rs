//! git::interface
//!
//! Git facade for a single package checkout.
//!
//! # Architecture
//!
//! A `Git` value is bound to exactly one directory. Opening never walks up
//! to a parent repository, so a package directory that is not itself a
//! checkout is reported as [`GitError::NotARepo`] instead of silently
//! resolving to the workspace root.
//!
//! Reads (revision, branch, status, ancestry, branch enumeration) and branch
//! creation go through `git2`. Commands that must honor the user's
//! credentials, hooks and config (clone, fetch, push, commit, checkout) run
//! the `git` binary and surface a non-zero exit as
//! [`GitError::CommandFailed`] carrying the command line and stderr.
//!
//! There are no retries. The caller decides whether to abort or continue.
//!
//! # Example
//!
//! ```ignore
//! use pegboard::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("workspace/net"))?;
//! let head = git.current_revision()?;
//! println!("net is at {} ({} commits)", head.short(7), git.sequence_in_branch()?);
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::core::types::{Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The directory is not the root of a Git checkout.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// HEAD is not on a branch.
    #[error("HEAD is detached in {path}")]
    DetachedHead {
        /// Working directory of the checkout
        path: PathBuf,
    },

    /// No remote is configured.
    #[error("no remote configured in {path}")]
    NoRemote {
        /// Working directory of the checkout
        path: PathBuf,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// A `git` command exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Captured standard error
        stderr: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
        }
    }
}

/// A remote-tracking branch and its tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
    /// Remote name, e.g. `origin`
    pub remote: String,
    /// Branch name on the remote, e.g. `release/2`
    pub name: String,
    /// Commit the branch points at
    pub tip: Oid,
}

impl RemoteBranch {
    /// `remote/name`, as git prints it.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.remote, self.name)
    }
}

/// The Git facade.
///
/// All operations are blocking and scoped to the bound directory.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    /// Working directory the facade is bound to
    work_dir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Opening
    // =========================================================================

    /// Open the checkout whose working directory is exactly `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a checkout root
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self {
            repo,
            work_dir: path.to_path_buf(),
        })
    }

    /// Clone `url` into `parent/name` and open the new checkout.
    pub fn clone_into(url: &str, parent: &Path, name: &str) -> Result<Self, GitError> {
        run_git(parent, &["clone", url, name])?;
        Self::open(&parent.join(name))
    }

    /// Working directory this facade is bound to.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    // =========================================================================
    // Revision and Status
    // =========================================================================

    /// Get the HEAD commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    pub fn current_revision(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();

        Oid::new(oid.to_string()).map_err(|e| e.into())
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            return Ok(head.shorthand().map(String::from));
        }

        Ok(None)
    }

    /// Check for uncommitted changes to tracked files.
    ///
    /// Untracked and ignored files do not count.
    pub fn is_dirty(&self) -> Result<bool, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != git2::Status::CURRENT))
    }

    /// Number of commits on the first-parent chain ending at HEAD.
    ///
    /// Equivalent to `git rev-list --count --first-parent HEAD`.
    pub fn sequence_in_branch(&self) -> Result<u64, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk
            .push_head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        revwalk.simplify_first_parent()?;

        let mut count = 0;
        for oid in revwalk {
            oid?;
            count += 1;
        }
        Ok(count)
    }

    // =========================================================================
    // Ancestry
    // =========================================================================

    /// Check whether `ancestor` is HEAD or an ancestor of HEAD.
    ///
    /// A revision that is not a full object id, or that names an object this
    /// checkout does not have, is not contained.
    pub fn contains(&self, ancestor: &str) -> Result<bool, GitError> {
        let head = self.current_revision()?;
        self.is_ancestor(ancestor, head.as_str())
    }

    /// Check whether `ancestor` is `descendant` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        let Some(ancestor) = self.find_commit_id(ancestor)? else {
            return Ok(false);
        };
        let Some(descendant) = self.find_commit_id(descendant)? else {
            return Ok(false);
        };

        // A commit is its own ancestor
        if ancestor == descendant {
            return Ok(true);
        }

        self.repo
            .graph_descendant_of(descendant, ancestor)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })
    }

    fn find_commit_id(&self, revision: &str) -> Result<Option<git2::Oid>, GitError> {
        let Ok(oid) = Oid::new(revision) else {
            return Ok(None);
        };
        let oid = git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, revision))?;
        match self.repo.find_commit(oid) {
            Ok(commit) => Ok(Some(commit.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, revision)),
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Stage `file`, commit all tracked changes if the tree is dirty, and
    /// return HEAD.
    ///
    /// A clean tree is left untouched and its current HEAD is returned.
    pub fn commit_if_dirty(&self, file: &str, message: &str) -> Result<Oid, GitError> {
        if self.work_dir.join(file).exists() {
            self.run(&["add", "--", file])?;
        }
        if self.is_dirty()? {
            debug!(path = %self.work_dir.display(), "committing pending changes");
            self.run(&["commit", "--all", "--quiet", "-m", message])?;
        }
        self.current_revision()
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// List local branch names.
    pub fn local_branches(&self) -> Result<Vec<String>, GitError> {
        let mut names: Vec<String> = self
            .branch_tips(git2::BranchType::Local)?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// List remote-tracking branches, skipping symbolic `HEAD` entries.
    pub fn remote_branches(&self) -> Result<Vec<RemoteBranch>, GitError> {
        let mut result = Vec::new();
        for (full_name, tip) in self.branch_tips(git2::BranchType::Remote)? {
            let Some((remote, name)) = full_name.split_once('/') else {
                continue;
            };
            if name == "HEAD" {
                continue;
            }
            result.push(RemoteBranch {
                remote: remote.to_string(),
                name: name.to_string(),
                tip,
            });
        }
        result.sort_by(|a, b| a.full_name().cmp(&b.full_name()));
        Ok(result)
    }

    /// Local and remote-tracking branches whose tip contains `revision`.
    ///
    /// Remote branches are reported as `remote/name`.
    pub fn branches_containing(&self, revision: &str) -> Result<Vec<String>, GitError> {
        let mut result = Vec::new();
        for kind in [git2::BranchType::Local, git2::BranchType::Remote] {
            for (name, tip) in self.branch_tips(kind)? {
                if name.ends_with("/HEAD") {
                    continue;
                }
                if self.is_ancestor(revision, tip.as_str())? {
                    result.push(name);
                }
            }
        }
        result.sort();
        Ok(result)
    }

    fn branch_tips(&self, kind: git2::BranchType) -> Result<Vec<(String, Oid)>, GitError> {
        let mut result = Vec::new();
        for branch in self.repo.branches(Some(kind))? {
            let (branch, _) = branch?;
            // Skip branches with non-UTF8 names
            let Some(name) = branch.name().ok().flatten().map(String::from) else {
                continue;
            };
            let Ok(commit) = branch.get().peel_to_commit() else {
                continue;
            };
            result.push((name, Oid::new(commit.id().to_string())?));
        }
        Ok(result)
    }

    /// Upstream of the current branch as `remote/name`, if any.
    pub fn upstream_branch(&self) -> Result<Option<String>, GitError> {
        let Some(current) = self.current_branch()? else {
            return Ok(None);
        };
        let branch = self
            .repo
            .find_branch(&current, git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, &current))?;
        match branch.upstream() {
            Ok(upstream) => Ok(upstream.name().ok().flatten().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether any remote is configured.
    pub fn has_remote(&self) -> Result<bool, GitError> {
        Ok(!self.repo.remotes()?.is_empty())
    }

    /// Get the default remote name (usually "origin").
    ///
    /// Returns the first remote found, or `None` if no remotes exist.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;

        // Prefer "origin" if it exists
        for name in remotes.iter().flatten() {
            if name == "origin" {
                return Ok(Some(name.to_string()));
            }
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    /// Create a local branch at HEAD. Fails if it already exists.
    pub fn create_branch(&self, name: &str) -> Result<(), GitError> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        self.repo
            .branch(name, &head, false)
            .map_err(|e| GitError::from_git2(e, name))?;
        Ok(())
    }

    /// Switch to an existing branch.
    pub fn checkout_branch(&self, name: &str) -> Result<(), GitError> {
        self.run(&["checkout", "--quiet", name])?;
        Ok(())
    }

    /// Check out a revision, detaching HEAD.
    pub fn checkout(&self, revision: &str) -> Result<(), GitError> {
        self.run(&["checkout", "--quiet", "--detach", revision])?;
        Ok(())
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// Fetch all remotes.
    pub fn fetch(&self) -> Result<(), GitError> {
        self.run(&["fetch", "--all", "--quiet"])?;
        Ok(())
    }

    /// Push the current branch, establishing upstream tracking when missing.
    pub fn push(&self) -> Result<(), GitError> {
        if self.upstream_branch()?.is_some() {
            self.run(&["push", "--quiet"])?;
            return Ok(());
        }

        let branch = self.current_branch()?.ok_or_else(|| GitError::DetachedHead {
            path: self.work_dir.clone(),
        })?;
        let remote = self.default_remote()?.ok_or_else(|| GitError::NoRemote {
            path: self.work_dir.clone(),
        })?;
        self.run(&["push", "--quiet", "--set-upstream", &remote, &branch])?;
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        run_git(&self.work_dir, args)
    }
}

/// Run `git` in `dir`, returning trimmed stdout.
fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let command = format!("git {}", args.join(" "));
    debug!(dir = %dir.display(), %command, "running");

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| GitError::CommandFailed {
            command: command.clone(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
