//! peg command - Commit editable packages and propagate their revisions

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Peg every editable package, then optionally push them.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `push` - Push every pegged package afterwards
/// * `message` - Commit message for packages with pending changes
pub fn peg(ctx: &Context, push: bool, message: Option<&str>) -> Result<()> {
    let mut workspace = ctx.open_workspace()?;

    let report = workspace.peg(message).context("Peg failed")?;

    if report.is_empty() {
        output::print("No editable packages to peg.", ctx.verbosity);
        return Ok(());
    }

    for pegged in &report.packages {
        let mut line = format!("{} -> {}", pegged.name, pegged.reference);
        if pegged.committed {
            line.push_str(" (committed)");
        }
        output::print(line, ctx.verbosity);
        for dependent in &pegged.rewritten {
            output::debug(
                format!("updated requirement on {} in {}", pegged.name, dependent),
                ctx.verbosity,
            );
        }
    }

    if push {
        let names: Vec<String> = report.names().map(String::from).collect();
        workspace.push(&names).context("Push failed")?;
        output::success(
            format!("Pushed {} package(s).", names.len()),
            ctx.verbosity,
        );
    }

    Ok(())
}
