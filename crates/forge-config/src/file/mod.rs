//! forge.toml parsing and validation

use camino::{Utf8Path, Utf8PathBuf};
use forge_core::error::ForgeError;
use serde::{Deserialize, Serialize};

use crate::ConfigResult;

/// Complete forge.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForgeToml {
    /// Forge connection section
    #[serde(default)]
    pub forge: ForgeSection,
}

/// The `[forge]` table. Every key is optional so files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgeSection {
    /// Forge host or base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseurl: Option<String>,

    /// Authorization header value, e.g. "Bearer <token>"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Directory of extra trusted *.pem certificates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_dir: Option<String>,
}

impl ForgeSection {
    /// Overwrite fields that `other` sets
    pub fn overlay(&mut self, other: ForgeSection) {
        if other.baseurl.is_some() {
            self.baseurl = other.baseurl;
        }
        if other.authorization.is_some() {
            self.authorization = other.authorization;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.cert_dir.is_some() {
            self.cert_dir = other.cert_dir;
        }
    }

    /// Check if no key is set
    pub fn is_empty(&self) -> bool {
        self == &ForgeSection::default()
    }
}

/// Parse TOML string to ForgeToml configuration
pub fn parse_forge_toml(content: &str, file: &str) -> ConfigResult<ForgeToml> {
    let config: ForgeToml = toml::from_str(content).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        ForgeError::TomlParse {
            file: file.to_string(),
            message: e.message().to_string(),
            line,
            column,
        }
    })?;

    validate_section(&config.forge)?;

    Ok(config)
}

/// Serialize configuration back to TOML
pub fn serialize_forge_toml(config: &ForgeToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| ForgeError::ConfigValidation {
        field: "forge".to_string(),
        reason: format!("TOML serialization error: {}", e),
    })
}

/// Validate values that parse but make no sense
pub fn validate_section(section: &ForgeSection) -> ConfigResult<()> {
    if let Some(baseurl) = &section.baseurl {
        if baseurl.trim().is_empty() {
            return Err(ForgeError::ConfigValidation {
                field: "baseurl".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
    }

    if let Some(authorization) = &section.authorization {
        if authorization.trim().is_empty() {
            return Err(ForgeError::ConfigValidation {
                field: "authorization".to_string(),
                reason: "must not be empty; remove the key to send no token".to_string(),
            });
        }
    }

    if section.timeout == Some(0) {
        return Err(ForgeError::ConfigValidation {
            field: "timeout".to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }

    Ok(())
}

/// Load forge.toml from file.
///
/// A relative `cert_dir` is resolved against the file's directory.
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<ForgeToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ForgeError::io(format!("Failed to read {}", path), e))?;

    let mut config = parse_forge_toml(&content, path.as_str())?;

    let relative = config
        .forge
        .cert_dir
        .as_deref()
        .map(Utf8PathBuf::from)
        .filter(|dir| dir.is_relative());

    if let (Some(cert_dir), Some(parent)) = (relative, path.parent()) {
        config.forge.cert_dir = Some(parent.join(cert_dir).into_string());
    }

    Ok(config)
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}
