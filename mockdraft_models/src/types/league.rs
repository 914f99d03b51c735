//! League types.

use serde::{Deserialize, Serialize};

/// Surrogate key of a league row.
pub type LeagueId = i64;

/// A junior or professional league that teams play in (e.g. "OHL").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: LeagueId,

    /// Unique league name.
    pub name: String,
}

/// Insert payload for a league. The id is assigned by the database.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewLeague {
    pub name: String,
}

impl NewLeague {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
