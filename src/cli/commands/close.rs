//! close command - Disable editables

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Disable the editables of the given packages, or of the whole workspace.
pub fn close(ctx: &Context, packages: &[String]) -> Result<()> {
    let workspace = ctx.open_workspace()?;
    let closed = workspace
        .close(packages)
        .context("Failed to disable editables")?;

    if closed.is_empty() {
        output::print("No editables to close.", ctx.verbosity);
    } else {
        output::success(
            format!("Closed:\n{}", output::format_list(&closed, "  ")),
            ctx.verbosity,
        );
    }
    Ok(())
}
