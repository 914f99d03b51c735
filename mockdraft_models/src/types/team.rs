//! Team types.

use serde::{Deserialize, Serialize};

use super::league::{League, LeagueId};

/// Surrogate key of a team row.
pub type TeamId = i64;

/// A team, resolved together with the league it plays in.
///
/// The natural key is `(name, league.id)`: two leagues may each have a team
/// with the same name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub league: League,
}

/// Insert payload for a team. The league must already exist.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub league_id: LeagueId,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, league_id: LeagueId) -> Self {
        Self {
            name: name.into(),
            league_id,
        }
    }
}
