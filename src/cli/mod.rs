//! cli
//!
//! Command-line interface layer for pegboard.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load the workspace configuration once
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, resolves the
//! workspace root and configuration, and dispatches to the handlers in
//! [`commands`], which call into [`crate::workspace`].

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::WorkspaceConfig;
use crate::manager::Conan;
use crate::ui::output::Verbosity;
use crate::workspace::Workspace;

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Workspace root
    pub root: PathBuf,
    /// `-m/--main` override
    pub main: Option<String>,
    pub verbosity: Verbosity,
}

impl Context {
    /// Load the configuration and open the workspace with the configured
    /// package manager.
    pub fn open_workspace(&self) -> Result<Workspace<Conan>> {
        let config = WorkspaceConfig::load(&self.root, self.main.as_deref())
            .context("Failed to load workspace configuration")?;
        let manager = Conan::new(config.package_manager());
        Workspace::open(config, manager).context("Failed to open workspace")
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let root = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let ctx = Context {
        root,
        main: cli.main,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
