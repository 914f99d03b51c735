//! Domain types shared by the Mock Draft data-access layer and its consumers.
//!
//! Value objects are plain data: the repository builds fresh instances from
//! rows on every call and never hands out shared references into a cache.

mod draft_year;
pub mod types;

pub use self::draft_year::{draft_year_for, DRAFT_AGE_BASE, DRAFT_CUTOFF};
pub use self::types::{
    League, LeagueId, NewLeague, NewProspect, NewTeam, Prospect, ProspectId, Team, TeamId,
};
