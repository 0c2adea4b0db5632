//! Error types and result aliases for Forge operations.
//!
//! A single error type covers connection setup, registry responses, body
//! decoding and configuration loading, each with enough context (request
//! path, status code, file location) to be reported without further lookup.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for all Forge operations
#[derive(Error, Debug)]
pub enum ForgeError {
    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    TomlParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Input errors
    #[error("Invalid module name '{name}': {reason}")]
    InvalidModuleName { name: String, reason: String },

    // Connection errors
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    // Registry errors
    #[error("Request to Forge '{path}' failed. Status: {status}")]
    Registry {
        path: String,
        status: u16,
        /// Decoded JSON error body, when the registry sent one
        body: Option<serde_json::Value>,
    },

    #[error("Failed to decode Forge response for '{path}': {message}")]
    Decode {
        path: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Forge operations
pub type ForgeResult<T> = Result<T, ForgeError>;

impl ForgeError {
    /// Create a connection error from any error type
    pub fn connection<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection error with no underlying cause
    pub fn connection_msg(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error for the given request path
    pub fn decode<E>(path: impl Into<String>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// HTTP status code reported by the registry, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ForgeError::Registry { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Request path the error relates to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            ForgeError::Registry { path, .. } | ForgeError::Decode { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ForgeError::Registry { status: 404, .. } => {
                Some("Check the module name spelling; names look like 'author/module'")
            },
            ForgeError::Registry { status: 401 | 403, .. } => {
                Some("Check the authorization token in forge.toml or FORGE_AUTHORIZATION")
            },
            ForgeError::Registry { status, .. } if *status >= 500 => {
                Some("The Forge reported a server error; try again later")
            },
            ForgeError::Connection { .. } => {
                Some("Check your internet connection and the configured forge host")
            },
            ForgeError::InvalidModuleName { .. } => {
                Some("Module names are written as 'author/module' or 'author-module'")
            },
            _ => None,
        }
    }
}
