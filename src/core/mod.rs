//! core
//!
//! Core domain types, schemas, and graph operations.
//!
//! # Modules
//!
//! - [`reference`] - Package reference grammar
//! - [`types`] - Strong types: Oid
//! - [`graph`] - Dependency graph, ordering and ancestors
//! - [`lockfile`] - Lock file reading and graph construction
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing here runs external commands

pub mod config;
pub mod graph;
pub mod lockfile;
pub mod reference;
pub mod types;
