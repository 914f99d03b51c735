//! Connection target: which database file a command opens.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rusqlite::OpenFlags;

use super::error::DbError;

/// A validated on-disk database location.
///
/// In-memory databases are rejected: every command opens its own connection,
/// so a private in-memory database would be empty for each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTarget {
    path: PathBuf,
    identity: String,
}

impl DbTarget {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let raw = path.to_string_lossy();
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("sqlite://").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(DbError::InvalidTarget("empty database path".to_string()));
        }
        if trimmed == ":memory:" || trimmed.contains("mode=memory") || trimmed == "file::memory:" {
            return Err(DbError::InvalidTarget(trimmed.to_string()));
        }

        let file_part = uri_file_part(trimmed);
        if file_part.is_empty() {
            return Err(DbError::InvalidTarget(trimmed.to_string()));
        }

        let path = PathBuf::from(trimmed);
        let identity = identity_of(Path::new(file_part))
            .to_string_lossy()
            .into_owned();

        Ok(Self { path, identity })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stable key for this database, used to share reference caches between
    /// handles pointing at the same file.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn open_flags(&self, create: bool) -> OpenFlags {
        let mut flags =
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        flags
    }
}

/// File name inside a `file:` URI (scheme, authority and query removed);
/// plain paths pass through unchanged.
fn uri_file_part(target: &str) -> &str {
    let Some(rest) = target.strip_prefix("file:") else {
        return target;
    };
    let rest = rest
        .strip_prefix("//localhost")
        .or_else(|| rest.strip_prefix("//"))
        .unwrap_or(rest);
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Canonical path of the file, or of its directory when the file does not
/// exist yet, so a target keeps one identity across `init`.
fn identity_of(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            std::fs::canonicalize(parent)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

impl FromStr for DbTarget {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path(s)
    }
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_memory_targets() {
        assert!(matches!(DbTarget::from_path(""), Err(DbError::InvalidTarget(_))));
        assert!(matches!(DbTarget::from_path("   "), Err(DbError::InvalidTarget(_))));
        assert!(matches!(
            ":memory:".parse::<DbTarget>(),
            Err(DbError::InvalidTarget(_))
        ));
        assert!(matches!(
            DbTarget::from_path("file:draft?mode=memory&cache=shared"),
            Err(DbError::InvalidTarget(_))
        ));
    }

    #[test]
    fn strips_sqlite_scheme() {
        let target: DbTarget = "sqlite://draft.db".parse().unwrap();
        assert_eq!(target.path(), Path::new("draft.db"));
        assert!(matches!(
            DbTarget::from_path("sqlite://"),
            Err(DbError::InvalidTarget(_))
        ));
    }

    #[test]
    fn same_file_has_same_identity() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("draft.db");
        std::fs::write(&file, b"").unwrap();

        let direct = DbTarget::from_path(&file).unwrap();
        let dotted = DbTarget::from_path(dir.path().join(".").join("draft.db")).unwrap();
        assert_eq!(direct.identity(), dotted.identity());
    }

    #[test]
    fn file_uri_and_plain_path_share_identity() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("draft.db");
        std::fs::write(&file, b"").unwrap();

        let plain = DbTarget::from_path(&file).unwrap();
        let uri = DbTarget::from_path(format!("file:{}", file.display())).unwrap();
        let with_query = DbTarget::from_path(format!("file://{}?cache=private", file.display())).unwrap();
        assert_eq!(plain.identity(), uri.identity());
        assert_eq!(plain.identity(), with_query.identity());
        assert_eq!(uri.path(), Path::new(&format!("file:{}", file.display())));
    }

    #[test]
    fn file_uri_without_file_name_is_rejected() {
        assert!(matches!(
            DbTarget::from_path("file:?cache=shared"),
            Err(DbError::InvalidTarget(_))
        ));
    }

    #[test]
    fn identity_is_stable_before_and_after_creation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("late.db");
        let before = DbTarget::from_path(&file).unwrap();
        std::fs::write(&file, b"").unwrap();
        let after = DbTarget::from_path(&file).unwrap();
        assert_eq!(before.identity(), after.identity());
    }

    #[test]
    fn create_flag_only_when_requested() {
        let target = DbTarget::from_path("draft.db").unwrap();
        assert!(!target.open_flags(false).contains(OpenFlags::SQLITE_OPEN_CREATE));
        assert!(target.open_flags(true).contains(OpenFlags::SQLITE_OPEN_CREATE));
    }
}
