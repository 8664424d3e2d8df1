//! Validation of check commands and package identifiers.

use crate::error::{Error, Result};

const MAX_COMMAND_LEN: usize = 10_000;
const MAX_IDENTIFIER_LEN: usize = 255;

/// Validates check commands before they are handed to a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandValidator;

impl CommandValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates a command string before execution.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the command is empty, too
    /// long, or contains NUL bytes or line breaks.
    pub fn validate(&self, command: &str) -> std::result::Result<(), String> {
        if command.trim().is_empty() {
            return Err("command cannot be empty".to_string());
        }
        if command.len() > MAX_COMMAND_LEN {
            return Err(format!(
                "command exceeds {} bytes ({} bytes)",
                MAX_COMMAND_LEN,
                command.len()
            ));
        }
        if command.contains('\0') {
            return Err("command contains a NUL byte".to_string());
        }
        if command.contains('\n') || command.contains('\r') {
            return Err("command contains an embedded newline".to_string());
        }
        Ok(())
    }

    /// Validates a package or check identifier.
    ///
    /// Allows ASCII letters, digits, `-`, `_`, `.` and `@`. Rejects path
    /// separators, traversal and a leading `.` or `-`.
    pub fn validate_identifier(value: &str, kind: &str) -> Result<()> {
        let invalid = |reason: &str| {
            Err(Error::InvalidPackageName(format!(
                "{} name '{}' {}",
                kind, value, reason
            )))
        };

        if value.is_empty() {
            return invalid("is empty");
        }
        if value.len() > MAX_IDENTIFIER_LEN {
            return invalid("is too long");
        }
        if value.contains("..") {
            return invalid("contains path traversal");
        }
        if value.contains('/') || value.contains('\\') {
            return invalid("contains a path separator");
        }
        if value.starts_with('.') || value.starts_with('-') {
            return invalid("starts with '.' or '-'");
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
        {
            return invalid("contains invalid characters");
        }
        Ok(())
    }
}
