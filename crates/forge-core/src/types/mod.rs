//! Core data types for Forge queries.
//!
//! This module provides the fundamental types shared by the registry client:
//! - Module names and their registry slug form
//! - Release records as published by the Forge
//! - Ordered version lists derived from releases

pub mod module_name;
pub mod release;

// Re-export all public types
pub use module_name::ModuleName;
pub use release::{Release, VersionList};
