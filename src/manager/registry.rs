//! manager::registry
//!
//! The package manager's editable override table.
//!
//! # Format
//!
//! ```json
//! {
//!   "net/2.1.7.bbb222@acme/stable": { "path": "/ws/net", "layout": null }
//! }
//! ```
//!
//! # Reconciliation
//!
//! An entry is a workspace package's active editable only when a package of
//! that name is locked with the same semantic version, user and channel.
//! The revision is not compared: an editable is expected to move ahead of
//! the locked revision. Everything else in the table is stale and ignored,
//! including keys that do not follow the reference grammar, which other
//! projects sharing the registry are free to use.
//!
//! The table belongs to the package manager. It is read fresh on every
//! query and only changed through [`PackageManager`] commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ManagerError, PackageManager};
use crate::core::lockfile::LockedReferences;
use crate::core::reference::PackageReference;

/// One row of the persisted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub layout: Option<String>,
}

/// The persisted table, keyed by reference string.
pub type EditableTable = BTreeMap<String, RegistryEntry>;

/// An editable override accepted for a workspace package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editable {
    /// Reference the override is registered under
    pub package_reference: PackageReference,
    /// Override directory
    pub path: PathBuf,
    /// Build-layout hint
    pub layout: Option<String>,
}

impl Editable {
    pub fn new(package_reference: PackageReference, path: impl Into<PathBuf>) -> Self {
        Self {
            package_reference,
            path: path.into(),
            layout: None,
        }
    }
}

/// Editables keyed by package name.
pub type Editables = BTreeMap<String, Editable>;

/// Read the table. A missing file is an empty table.
pub fn read_table(path: &Path) -> Result<EditableTable, ManagerError> {
    if !path.exists() {
        return Ok(EditableTable::new());
    }
    let contents = fs::read_to_string(path).map_err(|e| ManagerError::Registry {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if contents.trim().is_empty() {
        return Ok(EditableTable::new());
    }
    serde_json::from_str(&contents).map_err(|e| ManagerError::Registry {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Keep the entries that match a locked reference.
///
/// When several entries match one package, the one with the highest
/// sequence in branch wins.
pub fn reconcile(table: &EditableTable, locked: &LockedReferences) -> Editables {
    let mut result = Editables::new();

    for (key, entry) in table {
        let reference = match PackageReference::parse(key) {
            Ok(reference) => reference,
            Err(e) => {
                debug!(entry = %key, error = %e, "ignoring unparseable editable entry");
                continue;
            }
        };

        let Some(locked_reference) = locked.get(reference.name()) else {
            continue;
        };
        if !locked_reference.same_line_as(&reference) {
            debug!(entry = %key, locked = %locked_reference, "ignoring stale editable entry");
            continue;
        }

        let newer = result.get(reference.name()).map_or(true, |current| {
            reference.sequence_in_branch() > current.package_reference.sequence_in_branch()
        });
        if newer {
            result.insert(
                reference.name().to_string(),
                Editable {
                    package_reference: reference,
                    path: entry.path.clone(),
                    layout: entry.layout.clone(),
                },
            );
        }
    }

    result
}

/// Repository interface over the editable table.
///
/// Reads go to the persisted table; writes go through the package manager.
pub struct EditableRegistry<'a> {
    table_path: &'a Path,
    manager: &'a dyn PackageManager,
}

impl<'a> EditableRegistry<'a> {
    pub fn new(table_path: &'a Path, manager: &'a dyn PackageManager) -> Self {
        Self {
            table_path,
            manager,
        }
    }

    /// Active editables of the workspace, recomputed from the table.
    pub fn load(&self, locked: &LockedReferences) -> Result<Editables, ManagerError> {
        let table = read_table(self.table_path)?;
        Ok(reconcile(&table, locked))
    }

    /// Register an editable override.
    pub fn add(&self, editable: &Editable) -> Result<(), ManagerError> {
        debug!(
            reference = %editable.package_reference,
            path = %editable.path.display(),
            "adding editable"
        );
        self.manager
            .editable_add(&editable.path, &editable.package_reference)
    }

    /// Disable an editable override.
    pub fn remove(&self, editable: &Editable) -> Result<(), ManagerError> {
        debug!(reference = %editable.package_reference, "removing editable");
        self.manager.editable_remove(&editable.package_reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn locked(refs: &[&str]) -> LockedReferences {
        refs.iter()
            .map(|r| {
                let reference = PackageReference::parse(r).unwrap();
                (reference.name().to_string(), reference)
            })
            .collect()
    }

    fn entry(path: &str) -> RegistryEntry {
        RegistryEntry {
            path: PathBuf::from(path),
            layout: None,
        }
    }

    #[test]
    fn accepts_entry_ahead_of_locked_revision() {
        let locked = locked(&["net/2.1.7.aaa111@acme/stable"]);
        let mut table = EditableTable::new();
        table.insert("net/2.1.9.bbb222@acme/stable".to_string(), entry("/ws/net"));

        let editables = reconcile(&table, &locked);
        let editable = &editables["net"];
        assert_eq!(editable.path, PathBuf::from("/ws/net"));
        assert_eq!(editable.package_reference.revision(), "bbb222");
    }

    #[test]
    fn rejects_mismatched_semantic_version() {
        let locked = locked(&["net/2.1.7.aaa111@acme/stable"]);
        let mut table = EditableTable::new();
        table.insert("net/3.0.7.aaa111@acme/stable".to_string(), entry("/ws/net"));

        assert!(reconcile(&table, &locked).is_empty());
    }

    #[test]
    fn rejects_mismatched_user_or_channel() {
        let locked = locked(&["net/2.1.7.aaa111@acme/stable"]);
        let mut table = EditableTable::new();
        table.insert("net/2.1.7.aaa111@other/stable".to_string(), entry("/a"));
        table.insert("net/2.1.7.aaa111@acme/testing".to_string(), entry("/b"));
        table.insert("net/2.1.7.aaa111".to_string(), entry("/c"));

        assert!(reconcile(&table, &locked).is_empty());
    }

    #[test]
    fn ignores_unknown_packages_and_foreign_keys() {
        let locked = locked(&["net/2.1.7.aaa111@acme/stable"]);
        let mut table = EditableTable::new();
        table.insert("log/1.0.1.ccc333@acme/stable".to_string(), entry("/ws/log"));
        table.insert("zlib/1.2.13@".to_string(), entry("/elsewhere"));

        assert!(reconcile(&table, &locked).is_empty());
    }

    #[test]
    fn newest_matching_entry_wins() {
        let locked = locked(&["net/2.1.7.aaa111@acme/stable"]);
        let mut table = EditableTable::new();
        table.insert("net/2.1.12.fff000@acme/stable".to_string(), entry("/new"));
        table.insert("net/2.1.8.eee000@acme/stable".to_string(), entry("/old"));

        let editables = reconcile(&table, &locked);
        assert_eq!(editables["net"].path, PathBuf::from("/new"));
    }

    #[test]
    fn read_table_handles_missing_and_layout() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("editable_packages.json");
        assert!(read_table(&path).unwrap().is_empty());

        fs::write(
            &path,
            r#"{"net/2.1.7.aaa111@acme/stable": {"path": "/ws/net", "layout": "layout.ini"}}"#,
        )
        .unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(
            table["net/2.1.7.aaa111@acme/stable"].layout.as_deref(),
            Some("layout.ini")
        );
    }

    #[test]
    fn read_table_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("editable_packages.json");
        fs::write(&path, "[1, 2").unwrap();

        assert!(matches!(
            read_table(&path),
            Err(ManagerError::Registry { .. })
        ));
    }
}
