//! Error types for the library layer.

use thiserror::Error;

use crate::db::DbError;

/// Errors produced by the library layer: data-access failures plus rejected
/// user input.
#[derive(Error, Debug)]
pub enum MockDraftError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// User-provided input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl MockDraftError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_display_unchanged() {
        let err: MockDraftError = DbError::Reuse("prepare called twice".to_string()).into();
        assert_eq!(err.to_string(), "command misuse: prepare called twice");
        assert!(!err.is_not_found());
    }

    #[test]
    fn invalid_input_display() {
        let err = MockDraftError::InvalidInput("name is empty".to_string());
        assert_eq!(err.to_string(), "invalid input: name is empty");
    }
}
