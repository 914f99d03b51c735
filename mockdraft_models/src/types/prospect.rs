//! Prospect types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::team::{Team, TeamId};
use crate::draft_year::draft_year_for;

/// Surrogate key of a prospect row.
pub type ProspectId = i64;

/// A draft prospect with every reference resolved.
///
/// `position` and `handedness` hold reference-table codes such as `"C"` or `"L"`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: ProspectId,
    pub name: String,
    pub team: Team,

    /// Height in inches.
    pub height: i32,

    /// Weight in pounds.
    pub weight: i32,

    pub position: String,
    pub handedness: String,
    pub birth_day: NaiveDate,
    pub draft_year: i32,
    pub birth_city: Option<String>,
    pub birth_country: Option<String>,
    pub notes: Option<String>,
}

/// Insert payload for a prospect.
///
/// References are given by key: the team by surrogate id, position and
/// handedness by code. A missing `draft_year` is derived from `birth_day`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewProspect {
    pub name: String,
    pub team_id: TeamId,
    pub height: i32,
    pub weight: i32,
    pub position: String,
    pub handedness: String,
    pub birth_day: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_year: Option<i32>,
    #[serde(default)]
    pub birth_city: Option<String>,
    #[serde(default)]
    pub birth_country: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewProspect {
    /// The draft year to store: the explicit one, or the first eligible year.
    pub fn effective_draft_year(&self) -> i32 {
        self.draft_year
            .unwrap_or_else(|| draft_year_for(self.birth_day))
    }
}
