//! Scoped command: one connection, one statement, one forward-only cursor.
//!
//! A `ScopedCommand` opens its connection on construction and releases the
//! cursor and then the connection exactly once, either through [`ScopedCommand::close`]
//! or when it is dropped. Cleanup failures are logged and swallowed so they can
//! never replace an error the caller is already propagating.
//!
//! Each instance is single-use: `prepare` may be called once, and the command
//! can be executed once. Calls made out of order fail with [`DbError::Reuse`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, ToSql};

use super::error::{is_duplicate_key, DbError};
use super::params::{describe, FromColumn, IntoParam};
use super::stats::CommandStats;
use super::target::DbTarget;

/// Number of SQLite VM instructions between command-timeout checks.
const PROGRESS_OPS: i32 = 1_000;

/// Default time a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-command execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOptions {
    /// Hard limit on a single statement's execution time.
    pub command_timeout: Option<Duration>,
    /// How long to wait on a locked database.
    pub busy_timeout: Duration,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            command_timeout: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Isolation override applied to the connection before the command is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadCommitted,
    /// Dirty reads from other connections sharing the page cache.
    ReadUncommitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Open,
    Prepared,
    Executed,
    Released,
}

/// Materialised result set read forward one row at a time.
struct Cursor {
    columns: HashMap<String, usize>,
    rows: std::vec::IntoIter<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl Cursor {
    fn advance(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }
}

/// A single-use wrapper around a connection, its command and its cursor.
pub struct ScopedCommand {
    conn: Option<Connection>,
    target: String,
    options: CommandOptions,
    stats: Arc<CommandStats>,
    stage: Stage,
    sql: Option<String>,
    params: Vec<(String, Value)>,
    cursor: Option<Cursor>,
    opened_at: Instant,
    exec_duration: Option<Duration>,
    row_count: usize,
    failed: bool,
    quiet: bool,
}

impl ScopedCommand {
    /// Open a connection to an existing database.
    pub fn open(
        target: &DbTarget,
        options: CommandOptions,
        stats: Arc<CommandStats>,
    ) -> Result<Self, DbError> {
        Self::open_with_flags(target, target.open_flags(false), options, stats)
    }

    /// Open a connection, creating the database file if needed. Schema bootstrap only.
    pub(crate) fn open_or_create(
        target: &DbTarget,
        options: CommandOptions,
        stats: Arc<CommandStats>,
    ) -> Result<Self, DbError> {
        Self::open_with_flags(target, target.open_flags(true), options, stats)
    }

    fn open_with_flags(
        target: &DbTarget,
        flags: OpenFlags,
        options: CommandOptions,
        stats: Arc<CommandStats>,
    ) -> Result<Self, DbError> {
        let connection_error = |source| DbError::Connection {
            target: target.identity().to_string(),
            source,
        };

        let conn = Connection::open_with_flags(target.path(), flags).map_err(connection_error)?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(connection_error)?;
        conn.busy_timeout(options.busy_timeout)
            .map_err(connection_error)?;

        stats.record_open();

        Ok(Self {
            conn: Some(conn),
            target: target.identity().to_string(),
            options,
            stats,
            stage: Stage::Open,
            sql: None,
            params: Vec::new(),
            cursor: None,
            opened_at: Instant::now(),
            exec_duration: None,
            row_count: 0,
            failed: false,
            quiet: false,
        })
    }

    /// Do not log execution failures. For statements expected to fail.
    pub fn quiet(&mut self) -> &mut Self {
        self.quiet = true;
        self
    }

    /// Override the connection's isolation level. Must precede `prepare`.
    pub fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<(), DbError> {
        self.require_stage(Stage::Open, "set_isolation_level must be called before prepare")?;
        let conn = self.connection()?;
        conn.pragma_update(
            None,
            "read_uncommitted",
            level == IsolationLevel::ReadUncommitted,
        )
        .map_err(DbError::execution)
    }

    /// Attach SQL text to this command. Allowed once per instance.
    pub fn prepare(&mut self, sql: impl Into<String>) -> Result<(), DbError> {
        self.require_stage(Stage::Open, "cannot reuse a command; prepare was already called")?;
        self.sql = Some(sql.into());
        self.stage = Stage::Prepared;
        Ok(())
    }

    /// Bind a named parameter. `name` may carry its `:`/`@`/`$` prefix; a bare
    /// name is bound as `:name`. Binding a name twice keeps the last value.
    pub fn bind(&mut self, name: &str, value: impl IntoParam) -> Result<&mut Self, DbError> {
        self.require_stage(Stage::Prepared, "parameters must be bound after prepare and before execution")?;
        let name = if name.starts_with([':', '@', '$']) {
            name.to_string()
        } else {
            format!(":{}", name)
        };
        let value = value.into_param();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        Ok(self)
    }

    /// Run the command as a read query and open its cursor.
    pub fn execute_query(&mut self) -> Result<(), DbError> {
        self.begin_execution()?;
        let started = Instant::now();
        let result = self.run_query();
        self.exec_duration = Some(started.elapsed());

        match result {
            Ok(cursor) => {
                self.stats.record_query();
                self.row_count = cursor.rows.len();
                self.cursor = Some(cursor);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run the command as an insert, update or delete and return the affected row count.
    ///
    /// With `ignore_duplicate_key`, a unique or primary-key violation returns
    /// `Ok(0)`. Every other failure is an execution error.
    pub fn execute_non_query(&mut self, ignore_duplicate_key: bool) -> Result<usize, DbError> {
        self.begin_execution()?;
        let started = Instant::now();
        let result = self.run_non_query();
        self.exec_duration = Some(started.elapsed());

        match result {
            Ok(changed) => {
                self.stats.record_non_query();
                self.row_count = changed;
                Ok(changed)
            }
            Err(e) if ignore_duplicate_key && is_duplicate_key(&e) => {
                self.stats.record_non_query();
                tracing::debug!(db = %self.target, "duplicate key ignored: {}", e);
                Ok(0)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run the command and return the first column of the first row.
    /// `None` when the query returns no rows or the value is NULL.
    pub fn execute_scalar<T: FromColumn>(&mut self) -> Result<Option<T>, DbError> {
        self.execute_query()?;
        if !self.next()? {
            return Ok(None);
        }
        let value = self
            .current_row()?
            .first()
            .cloned()
            .ok_or_else(|| DbError::Column {
                column: "#0".to_string(),
                message: "query returned no columns".to_string(),
            })?;
        read_value("#0", &value)
    }

    /// Run a multi-statement script. Used for schema bootstrap; takes the
    /// place of `prepare` and execution.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        self.require_stage(Stage::Open, "execute_batch needs an unused command")?;
        self.sql = Some(sql.to_string());
        self.stage = Stage::Executed;
        let started = Instant::now();
        let result = self.connection()?.execute_batch(sql);
        self.exec_duration = Some(started.elapsed());
        match result {
            Ok(()) => {
                self.stats.record_non_query();
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Advance the cursor. Returns whether a row is available.
    pub fn next(&mut self) -> Result<bool, DbError> {
        self.require_not_released()?;
        match self.cursor.as_mut() {
            Some(cursor) => Ok(cursor.advance()),
            None => Err(DbError::Reuse(
                "next called without a successful execute_query".to_string(),
            )),
        }
    }

    /// Read a non-null column of the current row.
    pub fn get<T: FromColumn>(&self, column: &str) -> Result<T, DbError> {
        self.get_opt(column)?.ok_or_else(|| DbError::Column {
            column: column.to_string(),
            message: "value is NULL".to_string(),
        })
    }

    /// Read a nullable column of the current row. NULL reads as `None`.
    pub fn get_opt<T: FromColumn>(&self, column: &str) -> Result<Option<T>, DbError> {
        let value = self.column_value(column)?;
        read_value(column, value)
    }

    /// Read a column, substituting `default` for NULL.
    pub fn get_or<T: FromColumn>(&self, column: &str, default: T) -> Result<T, DbError> {
        Ok(self.get_opt(column)?.unwrap_or(default))
    }

    pub fn is_null(&self, column: &str) -> Result<bool, DbError> {
        Ok(matches!(self.column_value(column)?, Value::Null))
    }

    /// Rowid of the last row inserted through this command's connection.
    pub fn last_insert_id(&self) -> Result<i64, DbError> {
        Ok(self.connection()?.last_insert_rowid())
    }

    /// Rows returned by the query, or rows affected by the write.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn exec_duration(&self) -> Option<Duration> {
        self.exec_duration
    }

    /// Release the cursor and connection now rather than at end of scope.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.stage == Stage::Released {
            return;
        }
        if matches!(self.stage, Stage::Open | Stage::Prepared) {
            tracing::warn!(db = %self.target, "command released without executing: {}", self);
        } else {
            tracing::debug!(args = %self.args_summary(), "{}", self);
        }

        self.cursor = None;
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, e)) = conn.close() {
                tracing::warn!(db = %self.target, "failed to close connection: {}", e);
            }
        }
        self.stage = Stage::Released;
    }

    fn begin_execution(&mut self) -> Result<(), DbError> {
        self.require_stage(Stage::Prepared, "command must be prepared exactly once before it executes")?;
        self.stage = Stage::Executed;
        Ok(())
    }

    fn run_query(&self) -> rusqlite::Result<Cursor> {
        let conn = self.live_connection()?;
        let sql = self.sql.as_deref().unwrap_or_default();
        self.arm_timeout(conn);

        let result = (|| -> rusqlite::Result<Cursor> {
            let mut stmt = conn.prepare(sql)?;
            let columns: HashMap<String, usize> = stmt
                .column_names()
                .iter()
                .enumerate()
                .map(|(i, name)| (name.to_ascii_lowercase(), i))
                .collect();
            let column_count = stmt.column_count();

            let params = self.named_params();
            let mut rows = stmt.query(params.as_slice())?;
            let mut buffered = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(row.get::<_, Value>(i)?);
                }
                buffered.push(values);
            }

            Ok(Cursor {
                columns,
                rows: buffered.into_iter(),
                current: None,
            })
        })();

        disarm_timeout(conn);
        result
    }

    fn run_non_query(&self) -> rusqlite::Result<usize> {
        let conn = self.live_connection()?;
        let sql = self.sql.as_deref().unwrap_or_default();
        self.arm_timeout(conn);
        let params = self.named_params();
        let result = conn.execute(sql, params.as_slice());
        disarm_timeout(conn);
        result
    }

    fn named_params(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }

    fn arm_timeout(&self, conn: &Connection) {
        if let Some(limit) = self.options.command_timeout {
            let deadline = Instant::now() + limit;
            conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
        }
    }

    fn fail(&mut self, e: rusqlite::Error) -> DbError {
        self.failed = true;
        self.stats.record_failure();
        if !self.quiet {
            tracing::error!(db = %self.target, "command failed: {}\n{}", e, self.sql.as_deref().unwrap_or_default());
        }
        DbError::execution(e)
    }

    fn require_stage(&self, expected: Stage, message: &str) -> Result<(), DbError> {
        self.require_not_released()?;
        if self.stage != expected {
            return Err(DbError::Reuse(message.to_string()));
        }
        Ok(())
    }

    fn require_not_released(&self) -> Result<(), DbError> {
        if self.stage == Stage::Released {
            return Err(DbError::Reuse("command has been released".to_string()));
        }
        Ok(())
    }

    fn connection(&self) -> Result<&Connection, DbError> {
        self.conn
            .as_ref()
            .ok_or_else(|| DbError::Reuse("command has been released".to_string()))
    }

    fn live_connection(&self) -> rusqlite::Result<&Connection> {
        self.conn.as_ref().ok_or(rusqlite::Error::InvalidQuery)
    }

    fn current_row(&self) -> Result<&[Value], DbError> {
        self.require_not_released()?;
        let cursor = self.cursor.as_ref().ok_or_else(|| {
            DbError::Reuse("columns cannot be read before execute_query".to_string())
        })?;
        cursor
            .current
            .as_deref()
            .ok_or_else(|| DbError::Reuse("no current row; call next first".to_string()))
    }

    fn column_value(&self, column: &str) -> Result<&Value, DbError> {
        let row = self.current_row()?;
        let columns = self
            .cursor
            .as_ref()
            .map(|c| &c.columns)
            .ok_or_else(|| DbError::Reuse("columns cannot be read before execute_query".to_string()))?;
        let index = columns
            .get(&column.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| DbError::Column {
                column: column.to_string(),
                message: "no such column in result set".to_string(),
            })?;
        row.get(index).ok_or_else(|| DbError::Column {
            column: column.to_string(),
            message: "column index out of range".to_string(),
        })
    }

    fn args_summary(&self) -> String {
        self.params
            .iter()
            .map(|(name, value)| format!("{}={}", name, describe(value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn disarm_timeout(conn: &Connection) {
    conn.progress_handler(0, None::<fn() -> bool>);
}

fn read_value<T: FromColumn>(column: &str, value: &Value) -> Result<Option<T>, DbError> {
    if matches!(value, Value::Null) {
        return Ok(None);
    }
    T::from_value(value).map(Some).ok_or_else(|| DbError::Column {
        column: column.to_string(),
        message: format!("cannot read {} as {}", describe(value), T::TYPE_NAME),
    })
}

impl fmt::Display for ScopedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: exec {}ms open {}ms rows {}: {}",
            if self.failed { "SQL-FAIL" } else { "SQL" },
            self.exec_duration.map(|d| d.as_millis()).unwrap_or(0),
            self.opened_at.elapsed().as_millis(),
            self.row_count,
            self.sql.as_deref().unwrap_or("no command")
        )
    }
}

impl Drop for ScopedCommand {
    fn drop(&mut self) {
        self.release();
    }
}
