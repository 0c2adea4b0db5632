//! Configuration loading for the Forge client
//!
//! This crate handles parsing and validation of forge.toml files and layers
//! them with environment variables and command line flags into the
//! effective settings used to build registry connections.

pub mod file;
pub mod merge;

// Re-export main types
pub use file::{ForgeSection, ForgeToml};
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, ForgeSettings};

use forge_core::error::ForgeError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ForgeError>;
