use std::fmt;

use thiserror::Error;

use crate::validation::FieldError;

/// The ordered field errors collected while validating a [`crate::SessionConfig`].
///
/// All violations are collected; `Display` reports the first one, the rest
/// stay reachable through [`ConfigErrors::iter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors(Vec<FieldError>);

impl ConfigErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// The first recorded violation.
    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    /// The message recorded for `field`, if that field failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.first() {
            Some(e) => write!(f, "{} -> {}", e.field, e.message),
            None => write!(f, "no errors"),
        }
    }
}

/// Errors surfaced by the session manager.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Construction-time configuration failure. Fix the config and reconstruct.
    #[error("Invalid session configuration: {0}")]
    Config(ConfigErrors),

    #[error("Failed to start the session: Already started")]
    AlreadyStarted,

    #[error("Session is not started yet")]
    NotStarted,

    /// The host environment has already begun sending output.
    #[error("Headers have already been sent by \"{file}\" at line {line}")]
    HeadersSent { file: String, line: u32 },

    /// Cookie or session parameter configuration was rejected by the host.
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// A host store operation failed.
    #[error("Storage error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_error(field: &str, message: &str) -> FieldError {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_config_errors_display_reports_first() {
        let errors = ConfigErrors::new(vec![
            field_error("samesite", "Can only be set to \"Strict\" or \"Lax\""),
            field_error("sid_length", "Must be between 22 and 256"),
        ]);

        assert_eq!(
            errors.to_string(),
            "samesite -> Can only be set to \"Strict\" or \"Lax\""
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_config_errors_lookup_by_field() {
        let errors = ConfigErrors::new(vec![
            field_error("samesite", "Can only be set to \"Strict\" or \"Lax\""),
            field_error("sid_length", "Must be between 22 and 256"),
        ]);

        assert_eq!(errors.get("sid_length"), Some("Must be between 22 and 256"));
        assert_eq!(errors.get("name"), None);
    }

    #[test]
    fn test_session_error_messages() {
        assert_eq!(
            SessionError::AlreadyStarted.to_string(),
            "Failed to start the session: Already started"
        );
        assert_eq!(
            SessionError::HeadersSent {
                file: "handler.rs".to_string(),
                line: 42
            }
            .to_string(),
            "Headers have already been sent by \"handler.rs\" at line 42"
        );
        assert_eq!(
            SessionError::Store("failed to unset session".to_string()).to_string(),
            "Storage error: failed to unset session"
        );
    }
}
