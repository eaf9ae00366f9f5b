//! core::lockfile
//!
//! Lock file parsing and dependency graph construction.
//!
//! # Format
//!
//! ```json
//! {
//!   "graph_lock": {
//!     "nodes": {
//!       "0": { "pref": "app/1.0.12.9fceb02d@acme/stable", "requires": ["1"] },
//!       "1": { "pref": "net/2.3.4.1a2b3c4d@acme/stable" }
//!     }
//!   }
//! }
//! ```
//!
//! Node ids are opaque. Every `requires` entry must name another node.
//! Unknown fields are ignored since the package manager owns this file.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::graph::DependencyGraph;
use super::reference::{PackageReference, ReferenceError};

/// Errors from reading a lock file.
#[derive(Debug, Error)]
pub enum LockFileError {
    #[error("failed to read lock file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse lock file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("lock file '{path}': node '{node}' requires unknown node '{missing}'")]
    MissingNode {
        path: PathBuf,
        node: String,
        missing: String,
    },

    #[error("lock file '{path}': {source}")]
    Reference {
        path: PathBuf,
        source: ReferenceError,
    },
}

/// Mapping from package name to its locked reference.
pub type LockedReferences = HashMap<String, PackageReference>;

#[derive(Debug, Deserialize)]
struct LockFile {
    graph_lock: GraphLock,
}

#[derive(Debug, Deserialize)]
struct GraphLock {
    nodes: BTreeMap<String, LockNode>,
}

#[derive(Debug, Deserialize)]
struct LockNode {
    pref: String,
    #[serde(default)]
    requires: Vec<String>,
}

/// Read a lock file from disk and build the graph and locked references.
pub fn read(path: &Path) -> Result<(DependencyGraph, LockedReferences), LockFileError> {
    let contents = fs::read_to_string(path).map_err(|e| LockFileError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    build(&contents, path)
}

/// Build the graph and locked references from lock file contents.
///
/// `path` is only used for error messages.
pub fn build(
    contents: &str,
    path: &Path,
) -> Result<(DependencyGraph, LockedReferences), LockFileError> {
    let lock: LockFile = serde_json::from_str(contents).map_err(|e| LockFileError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let nodes = lock.graph_lock.nodes;

    let mut names: HashMap<&str, String> = HashMap::new();
    let mut references = LockedReferences::new();
    let mut graph = DependencyGraph::new();

    for (id, node) in &nodes {
        let reference =
            PackageReference::parse(&node.pref).map_err(|e| LockFileError::Reference {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(
            package = reference.name(),
            revision = reference.revision(),
            "found locked package"
        );
        graph.add_package(reference.name());
        names.insert(id.as_str(), reference.name().to_string());
        references.insert(reference.name().to_string(), reference);
    }

    for (id, node) in &nodes {
        let dependent = &names[id.as_str()];
        for required in &node.requires {
            let dependency =
                names
                    .get(required.as_str())
                    .ok_or_else(|| LockFileError::MissingNode {
                        path: path.to_path_buf(),
                        node: id.clone(),
                        missing: required.clone(),
                    })?;
            graph.add_dependency(dependent, dependency);
        }
    }

    Ok((graph, references))
}
