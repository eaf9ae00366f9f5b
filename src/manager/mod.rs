//! manager
//!
//! Package manager seam.
//!
//! # Modules
//!
//! - [`traits`] - The `PackageManager` trait and its error type
//! - [`conan`] - Implementation backed by the `conan` executable
//! - [`registry`] - Editable override table and its reconciliation rule
//! - [`mock`] - Deterministic implementation for tests

pub mod conan;
pub mod mock;
pub mod registry;
pub mod traits;

pub use conan::Conan;
pub use registry::{Editable, EditableRegistry, Editables};
pub use traits::{ManagerError, PackageManager};
