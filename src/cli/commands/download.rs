//! download command - Clone a workspace package

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Clone `package`, check out its locked revision and make it editable.
pub fn download(ctx: &Context, package: &str) -> Result<()> {
    let workspace = ctx.open_workspace()?;

    let cloned = workspace
        .download(package)
        .with_context(|| format!("Failed to download '{}'", package))?;

    if cloned {
        output::success(format!("Downloaded {}.", package), ctx.verbosity);
    } else {
        output::warn(
            format!("{} is already downloaded; nothing to do.", package),
            ctx.verbosity,
        );
    }
    Ok(())
}
