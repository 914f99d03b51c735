//! SQLite access: connection targets, scoped commands and schema bootstrap.

mod command;
mod error;
mod params;
mod stats;
mod target;

use std::sync::Arc;

pub use command::{CommandOptions, IsolationLevel, ScopedCommand, DEFAULT_BUSY_TIMEOUT};
pub use error::DbError;
pub use params::{FromColumn, IntoParam};
pub use stats::{CommandStats, StatsSummary};
pub use target::DbTarget;

const SCHEMA: &str = include_str!("../../../schema/sqlite.sql");

/// Current schema revision, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

struct DatabaseInner {
    target: DbTarget,
    options: CommandOptions,
    isolation: Option<IsolationLevel>,
    stats: Arc<CommandStats>,
}

/// Handle to one database. Cloning shares the target, options and counters.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn new(target: DbTarget, options: CommandOptions) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                target,
                options,
                isolation: None,
                stats: Arc::new(CommandStats::default()),
            }),
        }
    }

    /// Apply an isolation override to every command this handle opens.
    pub fn with_isolation(self, level: IsolationLevel) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                target: self.inner.target.clone(),
                options: self.inner.options,
                isolation: Some(level),
                stats: self.inner.stats.clone(),
            }),
        }
    }

    pub fn target(&self) -> &DbTarget {
        &self.inner.target
    }

    pub fn options(&self) -> CommandOptions {
        self.inner.options
    }

    pub fn stats(&self) -> &CommandStats {
        &self.inner.stats
    }

    /// Open a new scoped command against this database.
    pub fn command(&self) -> Result<ScopedCommand, DbError> {
        let mut cmd =
            ScopedCommand::open(&self.inner.target, self.inner.options, self.inner.stats.clone())?;
        if let Some(level) = self.inner.isolation {
            cmd.set_isolation_level(level)?;
        }
        Ok(cmd)
    }

    /// Create the database file if needed, apply the schema and seed the
    /// reference tables. Safe to run repeatedly.
    pub fn init(&self) -> Result<(), DbError> {
        let before = self.schema_version_creating()?;

        let mut cmd = ScopedCommand::open_or_create(
            &self.inner.target,
            self.inner.options,
            self.inner.stats.clone(),
        )?;
        cmd.execute_batch(&format!(
            "{}\nPRAGMA user_version = {};",
            SCHEMA, SCHEMA_VERSION
        ))?;
        cmd.close();

        if before < SCHEMA_VERSION {
            tracing::info!(
                db = %self.inner.target,
                from = before,
                to = SCHEMA_VERSION,
                "schema initialised"
            );
        }
        Ok(())
    }

    /// Schema revision of an existing database; 0 before `init`.
    pub fn schema_version(&self) -> Result<i64, DbError> {
        let mut cmd = self.command()?;
        cmd.prepare("PRAGMA user_version")?;
        Ok(cmd.execute_scalar::<i64>()?.unwrap_or(0))
    }

    fn schema_version_creating(&self) -> Result<i64, DbError> {
        let mut cmd = ScopedCommand::open_or_create(
            &self.inner.target,
            self.inner.options,
            self.inner.stats.clone(),
        )?;
        cmd.prepare("PRAGMA user_version")?;
        Ok(cmd.execute_scalar::<i64>()?.unwrap_or(0))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("target", &self.inner.target.identity())
            .field("options", &self.inner.options)
            .field("isolation", &self.inner.isolation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_test_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = DbTarget::from_path(dir.path().join("draft.db")).expect("target");
        let db = Database::new(target, CommandOptions::default());
        db.init().expect("init schema");
        (dir, db)
    }

    fn count(db: &Database, table: &str) -> i64 {
        let mut cmd = db.command().unwrap();
        cmd.prepare(format!("SELECT COUNT(*) FROM {}", table)).unwrap();
        cmd.execute_scalar::<i64>().unwrap().unwrap()
    }

    #[test]
    fn init_seeds_reference_tables() {
        let (_dir, db) = open_test_db();
        assert_eq!(count(&db, "Position"), 5);
        assert_eq!(count(&db, "Handedness"), 2);
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn init_is_idempotent() {
        let (_dir, db) = open_test_db();
        db.init().unwrap();
        assert_eq!(count(&db, "Position"), 5);
        assert_eq!(count(&db, "League"), 0);
    }

    #[test]
    fn command_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = DbTarget::from_path(dir.path().join("missing.db")).unwrap();
        let db = Database::new(target, CommandOptions::default());
        let err = db.command().err().unwrap();
        assert!(err.is_connection_error());
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let (_dir, db) = open_test_db();
        let mut cmd = db.command().unwrap();
        cmd.quiet();
        cmd.prepare("INSERT INTO Team (Name, LeagueId) VALUES ('Orphans', 99)")
            .unwrap();
        assert!(matches!(
            cmd.execute_non_query(true),
            Err(DbError::Execution { .. })
        ));
    }

    #[test]
    fn isolation_override_applies_to_commands() {
        let (_dir, db) = open_test_db();
        let db = db.with_isolation(IsolationLevel::ReadUncommitted);
        let mut cmd = db.command().unwrap();
        cmd.prepare("PRAGMA read_uncommitted").unwrap();
        assert_eq!(cmd.execute_scalar::<i64>().unwrap(), Some(1));
    }

    #[test]
    fn clones_share_stats() {
        let (_dir, db) = open_test_db();
        let other = db.clone();
        let before = db.stats().summary();
        count(&other, "League");
        let delta = db.stats().summary().since(&before);
        assert_eq!(delta.commands_opened, 1);
        assert_eq!(delta.queries, 1);
    }
}
