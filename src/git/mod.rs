//! git
//!
//! Version-control facade for package checkouts.
//!
//! # Architecture
//!
//! This module is the only doorway to Git. No other module imports `git2`
//! or runs the `git` binary.
//!
//! # Responsibilities
//!
//! - Opening a checkout bound to one directory, cloning new ones
//! - Revision, branch, dirtiness and first-parent sequence queries
//! - Ancestry queries (`contains`, `is_ancestor`)
//! - Commit, checkout, branch creation, fetch and push
//!
//! # Invariants
//!
//! - A facade never resolves to a parent repository of its directory
//! - Command failures are reported with the command line and stderr

mod interface;

pub use interface::{Git, GitError, RemoteBranch};
