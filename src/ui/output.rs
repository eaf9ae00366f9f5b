//! ui::output
//!
//! What pegboard prints for the operator.
//!
//! Results of a command (the package table of `list`, the references a
//! `peg` registered) go to stdout so they can be piped. Warnings, errors and
//! `[debug]` notes go to stderr. Tracing from the library is a separate
//! channel, set up in `main` and filtered by `RUST_LOG`.

use std::fmt::Display;

/// How much the command line prints. Levels are ordered, so a message is
/// shown when the active level is at least the message's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// `--quiet`: errors only
    Quiet,
    Normal,
    /// `--debug`: also per-package details
    Debug,
}

impl Verbosity {
    /// `--quiet` overrides `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }
}

/// A line of command output.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity >= Verbosity::Normal {
        println!("{message}");
    }
}

/// A detail only worth showing with `--debug`.
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity >= Verbosity::Debug {
        eprintln!("[debug] {message}");
    }
}

/// The failure that ends the process. Never suppressed.
pub fn error(message: impl Display) {
    eprintln!("error: {message}");
}

pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity >= Verbosity::Normal {
        eprintln!("warning: {message}");
    }
}

/// Closing summary of a command that changed the workspace.
pub fn success(message: impl Display, verbosity: Verbosity) {
    print(message, verbosity);
}

/// One `list` row: fields joined with ` : `.
pub fn format_fields<T: Display>(fields: &[T]) -> String {
    fields
        .iter()
        .map(|field| field.to_string())
        .collect::<Vec<_>>()
        .join(" : ")
}

/// Package names under a heading, one per line behind `indent`.
pub fn format_list<T: Display>(items: &[T], indent: &str) -> String {
    items
        .iter()
        .map(|item| format!("{indent}{item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
