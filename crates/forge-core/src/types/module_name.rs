//! Forge module names.
//!
//! Users write modules as `author/module`; the Forge API addresses them as
//! `author-module`. Both spellings are accepted and map to the same slug.

use crate::error::{ForgeError, ForgeResult};
use std::fmt;
use std::str::FromStr;

/// A validated module name as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleName {
    raw: String,
}

impl ModuleName {
    /// Validate and wrap a module name
    pub fn parse(input: &str) -> ForgeResult<Self> {
        let raw = input.trim();

        if raw.is_empty() {
            return Err(ForgeError::InvalidModuleName {
                name: input.to_string(),
                reason: "module name is empty".to_string(),
            });
        }

        if let Some(bad) = raw.chars().find(|c| !Self::is_valid_char(*c)) {
            return Err(ForgeError::InvalidModuleName {
                name: input.to_string(),
                reason: format!("unexpected character '{}'", bad),
            });
        }

        if raw.starts_with(['/', '-']) || raw.ends_with(['/', '-']) {
            return Err(ForgeError::InvalidModuleName {
                name: input.to_string(),
                reason: "name must not start or end with a separator".to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
        })
    }

    fn is_valid_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/')
    }

    /// The name as written by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Registry slug: every `/` replaced with `-`
    pub fn slug(&self) -> String {
        self.raw.replace('/', "-")
    }

    /// API path for this module's metadata
    pub fn api_path(&self) -> String {
        format!("/v3/modules/{}", self.slug())
    }
}

impl FromStr for ModuleName {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
