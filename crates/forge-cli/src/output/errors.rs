//! Error message formatting with actionable suggestions.
//!
//! Renders a `ForgeError` with its suggestion, request details and the
//! chain of underlying causes.

use forge_core::error::ForgeError;
use super::colors::{ColorSupport, Style};
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error with context and suggestions
    pub fn format_error(&self, error: &ForgeError) -> String {
        let mut output = format!("{}: {}\n", self.colors.paint(Style::Red, "error"), error);

        if let ForgeError::Registry { body: Some(body), .. } = error {
            if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
                output.push_str(&format!("{}: {}\n", self.colors.paint(Style::Dim, "forge"), message));
            }
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&format!("{}: {}\n", self.colors.paint(Style::Dim, "help"), suggestion));
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&format!("{}: {}\n", self.colors.paint(Style::Dim, "caused by"), err));
            source = err.source();
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn test_registry_error_with_forge_message() {
        let error = ForgeError::Registry {
            path: "/v3/modules/nobody-nothing".to_string(),
            status: 404,
            body: Some(serde_json::json!({ "message": "404 Not Found" })),
        };

        let rendered = formatter().format_error(&error);
        assert!(rendered.starts_with("error: Request to Forge '/v3/modules/nobody-nothing' failed. Status: 404"));
        assert!(rendered.contains("forge: 404 Not Found"));
        assert!(rendered.contains("help: Check the module name spelling"));
    }

    #[test]
    fn test_cause_chain_is_listed() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "certs unreadable");
        let error = ForgeError::connection("Failed to read certificate ca.pem", io);

        let rendered = formatter().format_error(&error);
        assert!(rendered.contains("caused by: certs unreadable"));
    }
}
