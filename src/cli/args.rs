//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Use this directory as the workspace root
//! - `-m` / `--main <name>`: Root project holding the lock file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pegboard - keep a multi-repository package workspace consistent
#[derive(Parser, Debug)]
#[command(name = "pegboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this directory as the workspace root
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Root project whose lock file defines the workspace
    #[arg(short, long, global = true)]
    pub main: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Commit editable packages and update their dependents' requirements
    #[command(
        long_about = "Commit editable packages and update their dependents' requirements.\n\n\
            Packages are processed dependencies first. Each downloaded, editable package \
            is committed if dirty, its editable is re-registered under the new revision, \
            and every editable package depending on it gets its declared revision \
            rewritten. Finally every processed package is installed once.\n\n\
            Without --message, all editable packages must be clean.",
        after_help = "\
EXAMPLES:
    # Propagate already committed work
    pegboard peg

    # Commit pending changes with a message, then push every package
    pegboard peg --message \"Use faster allocator\" --push"
    )]
    Peg {
        /// Push every pegged package afterwards
        #[arg(long)]
        push: bool,

        /// Commit message for packages with pending changes
        #[arg(long)]
        message: Option<String>,
    },

    /// Clone a package, check out its locked revision and make it editable
    Download {
        /// Package name as it appears in the lock file
        package: String,
    },

    /// Make packages editable (all downloaded packages if none are given)
    Edit {
        /// Packages to edit
        packages: Vec<String>,

        /// Register the checkout's current revision instead of the locked one
        #[arg(long)]
        actual: bool,
    },

    /// List the packages of the workspace, dependents first
    List {
        /// Show the checkout's sequence in branch and revision
        #[arg(long)]
        revision: bool,

        /// Show the current branch
        #[arg(long, conflicts_with = "branches")]
        branch: bool,

        /// Show local branches containing the checkout
        #[arg(long)]
        branches: bool,

        /// Show the upstream of the current branch
        #[arg(long)]
        upstream: bool,

        /// Show remote branches containing the checkout
        #[arg(long)]
        remotes: bool,

        /// Show the most stable remote branch containing the checkout
        #[arg(long)]
        stable: bool,
    },

    /// Disable editables (all of the workspace if no packages are given)
    Close {
        /// Packages to close
        packages: Vec<String>,
    },

    /// Generate shell completion scripts
    #[command(after_help = "\
EXAMPLES:
    pegboard completion bash > ~/.local/share/bash-completion/completions/pegboard
    pegboard completion zsh > ~/.zfunc/_pegboard")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
