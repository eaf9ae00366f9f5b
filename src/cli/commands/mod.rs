//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the workspace from the context
//! 2. Calls the workspace to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT touch checkouts or the registry directly.
//! `completion` needs no workspace at all.

mod close;
mod completion;
mod download;
mod edit;
mod list;
mod peg;

// Re-export command functions for testing and direct invocation
pub use close::close;
pub use completion::completion;
pub use download::download;
pub use edit::edit;
pub use list::{list, ListOptions};
pub use peg::peg;

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Peg { push, message } => peg::peg(ctx, push, message.as_deref()),
        Command::Download { package } => download::download(ctx, &package),
        Command::Edit { packages, actual } => edit::edit(ctx, &packages, actual),
        Command::List {
            revision,
            branch,
            branches,
            upstream,
            remotes,
            stable,
        } => list::list(
            ctx,
            ListOptions {
                revision,
                branch,
                branches,
                upstream,
                remotes,
                stable,
            },
        ),
        Command::Close { packages } => close::close(ctx, &packages),
        Command::Completion { shell } => completion::completion(shell),
    }
}
