//! workspace::branches
//!
//! Find the most integrated remote branch that already carries a commit,
//! e.g. to suggest which release branch a package can be promoted to.

use tracing::debug;

use super::WorkspaceError;
use crate::core::types::Oid;
use crate::git::{Git, RemoteBranch};

/// Among the remote branches whose tip contains `commit`, pick the one whose
/// tip contains every other candidate's tip.
///
/// Returns the branch name without its remote prefix together with its tip,
/// or `None` when no remote branch contains `commit`.
///
/// # Errors
///
/// [`WorkspaceError::AmbiguousBranch`] if two candidates have diverged.
pub fn most_stable_branch_containing(
    git: &Git,
    commit: &str,
) -> Result<Option<(String, Oid)>, WorkspaceError> {
    let mut best: Option<RemoteBranch> = None;

    for candidate in git.remote_branches()? {
        if !git.is_ancestor(commit, candidate.tip.as_str())? {
            continue;
        }

        best = Some(match best {
            None => candidate,
            Some(current) => {
                if git.is_ancestor(current.tip.as_str(), candidate.tip.as_str())? {
                    candidate
                } else if git.is_ancestor(candidate.tip.as_str(), current.tip.as_str())? {
                    current
                } else {
                    return Err(WorkspaceError::AmbiguousBranch {
                        first: current.full_name(),
                        second: candidate.full_name(),
                    });
                }
            }
        });
    }

    if let Some(branch) = &best {
        debug!(commit, branch = %branch.full_name(), "most stable branch");
    }
    Ok(best.map(|branch| (branch.name, branch.tip)))
}
