//! Reference-data cache for the small code tables (position, handedness).
//!
//! Each table is read once per database, on first access, into a pair of maps
//! (id -> code, code -> id). Loading goes through a `OnceCell`, so callers
//! racing on the first lookup wait for a single load and never observe a
//! partially built map. There is no refresh: the tables are static.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::db::{Database, DbError};

/// The code tables held by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTable {
    Position,
    Handedness,
}

impl ReferenceTable {
    pub const ALL: [ReferenceTable; 2] = [ReferenceTable::Position, ReferenceTable::Handedness];

    fn table_name(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Handedness => "Handedness",
        }
    }

    fn code_column(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Handedness => "Hand",
        }
    }

    fn entity(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Handedness => "handedness",
        }
    }
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity())
    }
}

/// Bidirectional id/code map for one reference table.
#[derive(Debug, Default)]
pub struct CodeTable {
    by_id: HashMap<i64, String>,
    by_code: HashMap<String, i64>,
}

impl CodeTable {
    fn insert(&mut self, id: i64, code: String) {
        self.by_code.insert(code.clone(), id);
        self.by_id.insert(id, code);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn code(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Exact match first, then a case-insensitive match when only one stored
    /// code fits.
    pub fn id(&self, code: &str) -> Option<i64> {
        if let Some(id) = self.by_code.get(code) {
            return Some(*id);
        }
        let mut folded = self
            .by_code
            .iter()
            .filter(|(stored, _)| stored.eq_ignore_ascii_case(code));
        match (folded.next(), folded.next()) {
            (Some((_, id)), None) => Some(*id),
            _ => None,
        }
    }

    /// Codes ordered by id.
    pub fn codes(&self) -> Vec<String> {
        let mut entries: Vec<(&i64, &String)> = self.by_id.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        entries.into_iter().map(|(_, code)| code.clone()).collect()
    }
}

/// Lazily loaded code tables for one database.
pub struct ReferenceCache {
    db: Database,
    position: OnceCell<CodeTable>,
    handedness: OnceCell<CodeTable>,
}

impl ReferenceCache {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            position: OnceCell::new(),
            handedness: OnceCell::new(),
        }
    }

    /// The table's maps, loading them on first access. A failed load leaves
    /// the table unloaded so the next access retries.
    pub fn table(&self, table: ReferenceTable) -> Result<&CodeTable, DbError> {
        self.cell(table).get_or_try_init(|| self.load(table))
    }

    pub fn is_loaded(&self, table: ReferenceTable) -> bool {
        self.cell(table).get().is_some()
    }

    pub fn code_for_id(&self, table: ReferenceTable, id: i64) -> Result<String, DbError> {
        self.table(table)?
            .code(id)
            .map(str::to_string)
            .ok_or_else(|| DbError::not_found(table.entity(), format!("id={}", id)))
    }

    /// Codes compare after trimming; case only matters when the table stores
    /// two codes differing by case.
    pub fn id_for_code(&self, table: ReferenceTable, code: &str) -> Result<i64, DbError> {
        self.table(table)?
            .id(code.trim())
            .ok_or_else(|| DbError::not_found(table.entity(), format!("code={}", code)))
    }

    pub fn codes(&self, table: ReferenceTable) -> Result<Vec<String>, DbError> {
        Ok(self.table(table)?.codes())
    }

    pub fn position_code(&self, id: i64) -> Result<String, DbError> {
        self.code_for_id(ReferenceTable::Position, id)
    }

    pub fn position_id(&self, code: &str) -> Result<i64, DbError> {
        self.id_for_code(ReferenceTable::Position, code)
    }

    pub fn handedness_code(&self, id: i64) -> Result<String, DbError> {
        self.code_for_id(ReferenceTable::Handedness, id)
    }

    pub fn handedness_id(&self, code: &str) -> Result<i64, DbError> {
        self.id_for_code(ReferenceTable::Handedness, code)
    }

    fn cell(&self, table: ReferenceTable) -> &OnceCell<CodeTable> {
        match table {
            ReferenceTable::Position => &self.position,
            ReferenceTable::Handedness => &self.handedness,
        }
    }

    fn load(&self, table: ReferenceTable) -> Result<CodeTable, DbError> {
        let mut cmd = self.db.command()?;
        cmd.prepare(format!(
            "SELECT Id, {} AS Code FROM {}",
            table.code_column(),
            table.table_name()
        ))?;
        cmd.execute_query()?;

        let mut codes = CodeTable::default();
        while cmd.next()? {
            let id: i64 = cmd.get("Id")?;
            let code: String = cmd.get("Code")?;
            codes.insert(id, code);
        }

        tracing::debug!(table = %table, entries = codes.len(), "loaded reference table");
        Ok(codes)
    }
}

impl fmt::Debug for ReferenceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceCache")
            .field("db", &self.db)
            .field("position_loaded", &self.is_loaded(ReferenceTable::Position))
            .field("handedness_loaded", &self.is_loaded(ReferenceTable::Handedness))
            .finish()
    }
}

/// One `ReferenceCache` per distinct database, keyed by target identity.
///
/// Owned by the application and passed to each repository it builds.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: DashMap<String, Arc<ReferenceCache>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache for `db`'s target, created on first request. Later handles to
    /// the same target share it, and it loads through the first handle.
    pub fn cache_for(&self, db: &Database) -> Arc<ReferenceCache> {
        self.caches
            .entry(db.target().identity().to_string())
            .or_insert_with(|| Arc::new(ReferenceCache::new(db.clone())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
