//! Rule-checking engine used at manager construction time.
//!
//! A [`Validator`] accumulates at most one error per field, in insertion
//! order. The pure predicates ([`permitted`], [`matches`], [`between`]) carry
//! no state and are composed by the caller.

use std::sync::LazyLock;

use regex::Regex;

/// Pattern for session names: alphanumeric-led identifiers.
pub static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+[a-zA-Z0-9._]+$").unwrap());

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulates the first error recorded for each field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` under `field` unless the field already failed.
    pub fn add_error(&mut self, field: &str, message: &str) {
        if !self.errors.iter().any(|e| e.field == field) {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }

    /// Records `message` under `field` only when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    /// The recorded errors, in insertion order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

/// Strict-equality membership test.
pub fn permitted<T: PartialEq>(value: &T, allowed: &[T]) -> bool {
    allowed.iter().any(|element| element == value)
}

/// Regular-expression match.
pub fn matches(value: &str, pattern: &Regex) -> bool {
    pattern.is_match(value)
}

/// Inclusive range test.
pub fn between<T: PartialOrd>(value: T, min_inclusive: T, max_inclusive: T) -> bool {
    min_inclusive <= value && value <= max_inclusive
}
