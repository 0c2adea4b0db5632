//! # forge-core
//!
//! Core types and utilities shared across the Forge client crates.
//!
//! This crate provides:
//! - `ModuleName`, `Release` and `VersionList` for registry queries
//! - `ForgeError` enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (ModuleName, Release, VersionList)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{ForgeError, ForgeResult};
pub use types::{ModuleName, Release, VersionList};
