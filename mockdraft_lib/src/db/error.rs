//! Error types for the data-access layer.

use thiserror::Error;

/// Errors produced by scoped commands and the repository built on them.
#[derive(Error, Debug)]
pub enum DbError {
    /// The backend could not be opened or reached.
    #[error("cannot connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Invalid connection target, rejected before any driver call.
    #[error("invalid connection target '{0}'")]
    InvalidTarget(String),

    /// A command was used out of order or after release.
    #[error("command misuse: {0}")]
    Reuse(String),

    /// The backend rejected or failed a statement. `message` is the driver's text.
    #[error("execution failed: {message}")]
    Execution {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A point lookup matched no rows.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A column was missing from the result set or could not be converted.
    #[error("column '{column}': {message}")]
    Column { column: String, message: String },
}

impl DbError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn execution(source: rusqlite::Error) -> Self {
        Self::Execution {
            message: source.to_string(),
            source,
        }
    }

    /// Unreachable or invalid targets. Both fail before any statement runs.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::InvalidTarget(_))
    }

    /// True for the `NotFound` variant. Existence checks branch on this.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Unique and primary-key violations. Foreign-key and check failures are not
/// duplicates and must still propagate.
pub(crate) fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(extended_code),
            Some("constraint failed".to_string()),
        )
    }

    #[test]
    fn unique_violation_is_duplicate() {
        assert!(is_duplicate_key(&sqlite_failure(
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )));
    }

    #[test]
    fn primary_key_violation_is_duplicate() {
        assert!(is_duplicate_key(&sqlite_failure(
            rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )));
    }

    #[test]
    fn foreign_key_violation_is_not_duplicate() {
        assert!(!is_duplicate_key(&sqlite_failure(
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        )));
    }

    #[test]
    fn other_errors_are_not_duplicate() {
        assert!(!is_duplicate_key(&rusqlite::Error::QueryReturnedNoRows));
    }

    #[test]
    fn execution_keeps_driver_message() {
        let err = DbError::execution(sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE));
        match &err {
            DbError::Execution { message, .. } => assert!(message.contains("constraint failed")),
            other => panic!("expected Execution, got {:?}", other),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn not_found_display() {
        let err = DbError::not_found("league", "name=OHL");
        assert_eq!(err.to_string(), "league not found: name=OHL");
        assert!(err.is_not_found());
    }

    #[test]
    fn reuse_display() {
        let err = DbError::Reuse("prepare called twice".to_string());
        assert_eq!(err.to_string(), "command misuse: prepare called twice");
        assert!(!err.is_not_found());
    }

    #[test]
    fn invalid_target_is_connection_class() {
        assert!(DbError::InvalidTarget(":memory:".to_string()).is_connection_error());
        assert!(!DbError::Reuse("x".to_string()).is_connection_error());
    }
}
