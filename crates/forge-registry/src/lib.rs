//! Forge module registry client
//!
//! This crate builds trusted, authenticated HTTP connections to a Forge
//! instance and queries it for the published versions of a module.

pub mod api;
pub mod client;
pub mod connection;

// Re-export main types
pub use api::ModuleResponse;
pub use client::{Endpoint, ForgeClient, DEFAULT_FORGE, LEGACY_FORGE};
pub use connection::{
    default_authorization, set_default_authorization, Connection, ConnectionBuilder,
    ConnectionOptions, ConnectionProvider, Response, TrustStore, USER_AGENT,
};

use forge_core::error::ForgeError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, ForgeError>;
