//! Terminal output formatting and utilities.
//!
//! Query results go to stdout undecorated so they can be piped; status
//! messages and errors are styled and go to stderr.

pub mod colors;
pub mod errors;

use colors::{ColorSupport, Style};

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Print a result line to stdout
    pub fn data(&self, line: &str) {
        println!("{}", line);
    }

    /// Print a labelled value
    pub fn field(&self, label: &str, value: &str) {
        println!("{} {}", self.colors.paint(Style::Bold, &format!("{:<14}", label)), value);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.paint(Style::Dim, message));
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.paint(Style::Yellow, "⚠"), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
