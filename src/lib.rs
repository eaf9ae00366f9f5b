//! Pegboard - keep a multi-repository package workspace consistent
//!
//! A workspace is a set of packages, each in its own git checkout under one
//! root, all named in the lock file of a main project. Downloaded packages
//! are registered as editable overrides with the package manager. Pegging
//! commits every editable package and rewrites the declarations of its
//! dependents so they name the revision that was actually committed.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to workspace)
//! - [`workspace`] - Workspace operations: peg, edit, close, download, status
//! - [`core`] - Package references, lock file, dependency graph, configuration
//! - [`git`] - Single interface for all Git operations
//! - [`manager`] - Package manager seam and its editable registry
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. Dependencies are always processed before their dependents
//! 2. A peg validates every package before changing any of them
//! 3. The editable registry is read fresh for every operation
//! 4. The graph is rebuilt from the lock file, never patched

pub mod cli;
pub mod core;
pub mod git;
pub mod manager;
pub mod ui;
pub mod workspace;
