//! edit command - Register packages as editable

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Make the given packages editable, or every downloaded package.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `packages` - Package names; empty means all downloaded packages
/// * `actual` - Register under the checkout's revision rather than the locked one
pub fn edit(ctx: &Context, packages: &[String], actual: bool) -> Result<()> {
    let workspace = ctx.open_workspace()?;
    workspace
        .edit(packages, actual)
        .context("Failed to register editables")?;

    let editables = workspace.editables()?;
    for (name, editable) in &editables {
        if packages.is_empty() || packages.contains(name) {
            output::print(
                output::format_fields(&[
                    editable.package_reference.to_string(),
                    editable.path.display().to_string(),
                ]),
                ctx.verbosity,
            );
        }
    }
    Ok(())
}
