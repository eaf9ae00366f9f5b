//! manager::mock
//!
//! Mock package manager for deterministic testing.
//!
//! # Design
//!
//! The mock keeps a real editable table on disk, in the same format the
//! real package manager writes, so registry reconciliation runs unchanged
//! against it. Installs are only recorded. A failure can be injected per
//! operation to exercise error paths.
//!
//! # Example
//!
//! ```
//! use pegboard::core::reference::PackageReference;
//! use pegboard::manager::mock::MockPackageManager;
//! use pegboard::manager::PackageManager;
//! use std::path::Path;
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let manager = MockPackageManager::new(dir.path().join("editables.json"));
//! let reference = PackageReference::parse("net/1.0.3.abc123@acme/stable").unwrap();
//!
//! manager.editable_add(Path::new("/ws/net"), &reference).unwrap();
//! manager.install(Path::new("/ws/net")).unwrap();
//!
//! assert_eq!(manager.installs(), vec![Path::new("/ws/net").to_path_buf()]);
//! assert!(manager.registered().contains_key("net/1.0.3.abc123@acme/stable"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::registry::{read_table, EditableTable, RegistryEntry};
use super::traits::{ManagerError, PackageManager};
use crate::core::reference::PackageReference;

/// An operation the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerOperation {
    Install(PathBuf),
    EditableAdd(PathBuf, String),
    EditableRemove(String),
}

/// Which operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Install,
    EditableAdd,
    EditableRemove,
}

/// Mock package manager for testing.
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MockPackageManager {
    registry_path: PathBuf,
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug, Default)]
struct MockInner {
    operations: Vec<ManagerOperation>,
    fail_on: Option<FailOn>,
}

impl MockPackageManager {
    /// Create a mock that keeps its editable table at `registry_path`.
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            inner: Arc::new(Mutex::new(MockInner::default())),
        }
    }

    /// Path of the editable table.
    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// Make the given operation fail from now on.
    pub fn fail_on(&self, operation: FailOn) {
        self.lock().fail_on = Some(operation);
    }

    /// Every operation received so far, in order.
    pub fn operations(&self) -> Vec<ManagerOperation> {
        self.lock().operations.clone()
    }

    /// Directories installed so far, in order.
    pub fn installs(&self) -> Vec<PathBuf> {
        self.lock()
            .operations
            .iter()
            .filter_map(|op| match op {
                ManagerOperation::Install(dir) => Some(dir.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded operations. The table on disk is kept.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Current contents of the editable table.
    pub fn registered(&self) -> EditableTable {
        read_table(&self.registry_path).unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, operation: ManagerOperation, kind: FailOn) -> Result<(), ManagerError> {
        let mut inner = self.lock();
        inner.operations.push(operation.clone());
        if inner.fail_on == Some(kind) {
            return Err(ManagerError::CommandFailed {
                command: format!("mock {:?}", operation),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn write_table(&self, table: &EditableTable) -> Result<(), ManagerError> {
        let to_error = |message: String| ManagerError::Registry {
            path: self.registry_path.clone(),
            message,
        };
        if let Some(parent) = self.registry_path.parent() {
            fs::create_dir_all(parent).map_err(|e| to_error(e.to_string()))?;
        }
        let contents = serde_json::to_string_pretty(table).map_err(|e| to_error(e.to_string()))?;
        fs::write(&self.registry_path, contents).map_err(|e| to_error(e.to_string()))
    }
}

impl PackageManager for MockPackageManager {
    fn name(&self) -> &str {
        "mock"
    }

    fn install(&self, directory: &Path) -> Result<(), ManagerError> {
        self.record(
            ManagerOperation::Install(directory.to_path_buf()),
            FailOn::Install,
        )
    }

    fn editable_add(&self, path: &Path, reference: &PackageReference) -> Result<(), ManagerError> {
        self.record(
            ManagerOperation::EditableAdd(path.to_path_buf(), reference.to_string()),
            FailOn::EditableAdd,
        )?;
        let mut table = read_table(&self.registry_path)?;
        table.insert(
            reference.to_string(),
            RegistryEntry {
                path: path.to_path_buf(),
                layout: None,
            },
        );
        self.write_table(&table)
    }

    fn editable_remove(&self, reference: &PackageReference) -> Result<(), ManagerError> {
        self.record(
            ManagerOperation::EditableRemove(reference.to_string()),
            FailOn::EditableRemove,
        )?;
        let mut table = read_table(&self.registry_path)?;
        table.remove(&reference.to_string());
        self.write_table(&table)
    }
}
