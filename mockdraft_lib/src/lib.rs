//! Data-access layer for the Mock Draft prospect tracker.
//!
//! Scoped commands over SQLite, a lazily loaded reference-data cache for the
//! position and handedness code tables, and an entity repository that resolves
//! team and league references without N+1 query fan-out.

pub mod config;
pub mod db;
pub mod error;
pub mod reference;
pub mod repository;
pub mod validation;

pub use mockdraft_models;
pub use mockdraft_models::{
    draft_year_for, League, LeagueId, NewLeague, NewProspect, NewTeam, Prospect, ProspectId,
    Team, TeamId,
};

pub use config::DbConfig;
pub use db::{
    CommandOptions, Database, DbError, DbTarget, IsolationLevel, ScopedCommand, StatsSummary,
};
pub use error::MockDraftError;
pub use reference::{CacheRegistry, CodeTable, ReferenceCache, ReferenceTable};
pub use repository::{ProspectKey, Repository};
