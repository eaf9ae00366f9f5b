//! list command - Show workspace packages

use std::collections::BTreeSet;

use crate::cli::Context;
use crate::ui::output;
use crate::workspace::branches::most_stable_branch_containing;
use anyhow::{Context as _, Result};

/// Which columns `list` shows after the locked reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub revision: bool,
    pub branch: bool,
    pub branches: bool,
    pub upstream: bool,
    pub remotes: bool,
    pub stable: bool,
}

impl ListOptions {
    fn needs_checkout(&self) -> bool {
        self.revision
            || self.branch
            || self.branches
            || self.upstream
            || self.remotes
            || self.stable
    }
}

/// Print one line per package, dependents first.
pub fn list(ctx: &Context, options: ListOptions) -> Result<()> {
    let workspace = ctx.open_workspace()?;
    let statuses = workspace.status().context("Failed to read workspace state")?;

    for status in statuses {
        let mut fields = vec![status.locked.to_string()];

        if options.needs_checkout() {
            let Some(checkout) = &status.checkout else {
                fields.push("not downloaded".to_string());
                output::print(output::format_fields(&fields), ctx.verbosity);
                continue;
            };
            let git = workspace.package(&status.name)?.git()?;
            let head = checkout.revision.as_str();

            if options.revision {
                fields.push(checkout.sequence_in_branch.to_string());
                fields.push(checkout.revision.to_string());
            }
            if options.branch {
                fields.push(
                    checkout
                        .branch
                        .clone()
                        .unwrap_or_else(|| "detached".to_string()),
                );
            }
            if options.branches {
                let local: BTreeSet<String> = git.local_branches()?.into_iter().collect();
                let containing: Vec<String> = git
                    .branches_containing(head)?
                    .into_iter()
                    .filter(|name| local.contains(name))
                    .collect();
                fields.push(containing.join(", "));
            }
            if options.upstream {
                fields.push(
                    git.upstream_branch()?
                        .unwrap_or_else(|| "no upstream".to_string()),
                );
            }
            if options.remotes {
                let mut remotes = Vec::new();
                for remote in git.remote_branches()? {
                    if git.is_ancestor(head, remote.tip.as_str())? {
                        remotes.push(remote.full_name());
                    }
                }
                fields.push(remotes.join(", "));
            }
            if options.stable {
                let stable = most_stable_branch_containing(&git, head)
                    .with_context(|| format!("Failed to find a stable branch for {}", status.name))?;
                fields.push(match stable {
                    Some((name, _)) => name,
                    None => "no remote branch".to_string(),
                });
            }
        }

        output::print(output::format_fields(&fields), ctx.verbosity);
    }

    Ok(())
}
