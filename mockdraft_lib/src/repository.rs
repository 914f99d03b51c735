//! Entity repository: leagues, teams and prospects over scoped commands.
//!
//! Every operation opens its own command, drains it and releases it before
//! returning. Nested references are resolved in application code: a prospect's
//! team (and the team's league) through follow-up point queries, its position
//! and handedness through the [`ReferenceCache`]. Batch reads share
//! an entity memo so each team and league is fetched at most once per call.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use mockdraft_models::{
    League, LeagueId, NewLeague, NewProspect, NewTeam, Prospect, ProspectId, Team, TeamId,
};

use crate::config::DbConfig;
use crate::db::{Database, DbError, IntoParam, ScopedCommand};
use crate::error::MockDraftError;
use crate::reference::{CacheRegistry, ReferenceCache};

const PROSPECT_COLUMNS: &str = "Id, Name, TeamId, Height, Weight, PositionId, HandednessId, \
                                BirthDay, DraftYear, BirthCity, BirthCountry, Notes";

/// Which columns identify "the same prospect" for lookups and existence checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProspectKey {
    /// Name and birth date.
    #[default]
    #[serde(rename = "name-birthday")]
    NameBirthDay,
    /// Name, position and team.
    #[serde(rename = "name-position-team")]
    NamePositionTeam,
}

impl FromStr for ProspectKey {
    type Err = MockDraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name-birthday" => Ok(Self::NameBirthDay),
            "name-position-team" => Ok(Self::NamePositionTeam),
            _ => Err(MockDraftError::InvalidInput(format!(
                "unknown prospect key '{}'. Valid values: name-birthday, name-position-team",
                s
            ))),
        }
    }
}

impl fmt::Display for ProspectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameBirthDay => write!(f, "name-birthday"),
            Self::NamePositionTeam => write!(f, "name-position-team"),
        }
    }
}

/// Teams and leagues already built during one repository call.
#[derive(Debug, Default)]
pub(crate) struct EntityMemo {
    teams: HashMap<TeamId, Team>,
    leagues: HashMap<LeagueId, League>,
}

impl EntityMemo {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub(crate) fn league_count(&self) -> usize {
        self.leagues.len()
    }
}

struct TeamRow {
    id: TeamId,
    name: String,
    league_id: LeagueId,
}

impl TeamRow {
    fn read(cmd: &ScopedCommand) -> Result<Self, DbError> {
        Ok(Self {
            id: cmd.get("Id")?,
            name: cmd.get("Name")?,
            league_id: cmd.get("LeagueId")?,
        })
    }
}

struct ProspectRow {
    id: ProspectId,
    name: String,
    team_id: TeamId,
    height: i32,
    weight: i32,
    position_id: i64,
    handedness_id: i64,
    birth_day: NaiveDate,
    draft_year: i32,
    birth_city: Option<String>,
    birth_country: Option<String>,
    notes: Option<String>,
}

impl ProspectRow {
    fn read(cmd: &ScopedCommand) -> Result<Self, DbError> {
        Ok(Self {
            id: cmd.get("Id")?,
            name: cmd.get("Name")?,
            team_id: cmd.get("TeamId")?,
            height: cmd.get("Height")?,
            weight: cmd.get("Weight")?,
            position_id: cmd.get("PositionId")?,
            handedness_id: cmd.get("HandednessId")?,
            birth_day: cmd.get("BirthDay")?,
            draft_year: cmd.get("DraftYear")?,
            birth_city: cmd.get_opt("BirthCity")?,
            birth_country: cmd.get_opt("BirthCountry")?,
            notes: cmd.get_opt("Notes")?,
        })
    }
}

fn read_league(cmd: &ScopedCommand) -> Result<League, DbError> {
    Ok(League {
        id: cmd.get("Id")?,
        name: cmd.get("Name")?,
    })
}

/// Map a point lookup to an existence answer: `NotFound` is `false`, any
/// other failure propagates.
fn exists<T>(lookup: Result<T, DbError>) -> Result<bool, DbError> {
    match lookup {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

pub struct Repository {
    db: Database,
    refs: Arc<ReferenceCache>,
    prospect_key: ProspectKey,
}

impl Repository {
    pub fn new(db: Database, refs: Arc<ReferenceCache>) -> Self {
        Self {
            db,
            refs,
            prospect_key: ProspectKey::default(),
        }
    }

    /// Repository for a configuration, sharing the registry's cache for its target.
    pub fn from_config(config: &DbConfig, registry: &CacheRegistry) -> Self {
        let db = config.database();
        let refs = registry.cache_for(&db);
        Self::new(db, refs).with_prospect_key(config.prospect_key)
    }

    pub fn with_prospect_key(mut self, key: ProspectKey) -> Self {
        self.prospect_key = key;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn references(&self) -> &ReferenceCache {
        &self.refs
    }

    pub fn prospect_key(&self) -> ProspectKey {
        self.prospect_key
    }

    // -- Leagues --

    pub fn get_all_leagues(&self) -> Result<Vec<League>, DbError> {
        self.query_all("SELECT Id, Name FROM League ORDER BY Id", Vec::new(), read_league)
    }

    pub fn get_league(&self, id: LeagueId) -> Result<League, DbError> {
        self.query_one(
            "league",
            format!("id={}", id),
            "SELECT Id, Name FROM League WHERE Id = @Id",
            vec![("@Id", id.into_param())],
            read_league,
        )
    }

    pub fn get_league_by_name(&self, name: &str) -> Result<League, DbError> {
        self.query_one(
            "league",
            format!("name={}", name),
            "SELECT Id, Name FROM League WHERE Name = @Name",
            vec![("@Name", name.into_param())],
            read_league,
        )
    }

    pub fn add_league(&self, league: &NewLeague) -> Result<LeagueId, DbError> {
        let id = self.insert(
            "INSERT INTO League (Name) VALUES (@Name)",
            vec![("@Name", league.name.as_str().into_param())],
        )?;
        tracing::debug!(id, name = %league.name, "league added");
        Ok(id)
    }

    pub fn league_name_exists(&self, name: &str) -> Result<bool, DbError> {
        exists(self.get_league_by_name(name))
    }

    // -- Teams --

    pub fn get_all_teams(&self) -> Result<Vec<Team>, DbError> {
        let rows = self.query_all(
            "SELECT Id, Name, LeagueId FROM Team ORDER BY Id",
            Vec::new(),
            TeamRow::read,
        )?;
        let mut memo = EntityMemo::new();
        rows.into_iter()
            .map(|row| self.team_from_row(row, &mut memo))
            .collect()
    }

    pub fn get_team(&self, id: TeamId) -> Result<Team, DbError> {
        self.team_in(id, &mut EntityMemo::new())
    }

    pub fn get_team_by_name(&self, name: &str, league_id: LeagueId) -> Result<Team, DbError> {
        let row = self.query_one(
            "team",
            format!("name={} league_id={}", name, league_id),
            "SELECT Id, Name, LeagueId FROM Team WHERE Name = @Name AND LeagueId = @LeagueId",
            vec![("@Name", name.into_param()), ("@LeagueId", league_id.into_param())],
            TeamRow::read,
        )?;
        self.team_from_row(row, &mut EntityMemo::new())
    }

    pub fn add_team(&self, team: &NewTeam) -> Result<TeamId, DbError> {
        let id = self.insert(
            "INSERT INTO Team (Name, LeagueId) VALUES (@Name, @LeagueId)",
            vec![
                ("@Name", team.name.as_str().into_param()),
                ("@LeagueId", team.league_id.into_param()),
            ],
        )?;
        tracing::debug!(id, name = %team.name, league_id = team.league_id, "team added");
        Ok(id)
    }

    pub fn team_exists(&self, name: &str, league_id: LeagueId) -> Result<bool, DbError> {
        exists(self.get_team_by_name(name, league_id))
    }

    // -- Prospects --

    /// Prospects whose stored draft year equals `year`, in id order.
    pub fn list_prospects_by_draft_year(&self, year: i32) -> Result<Vec<Prospect>, DbError> {
        self.top_prospects(year, None)
    }

    /// The first `limit` prospects for `year` in the same order as
    /// [`Repository::list_prospects_by_draft_year`]; `None` returns all.
    pub fn top_prospects(&self, year: i32, limit: Option<usize>) -> Result<Vec<Prospect>, DbError> {
        // SQLite treats a negative LIMIT as no limit.
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let rows = self.query_all(
            &format!(
                "SELECT {} FROM Prospect WHERE DraftYear = @DraftYear ORDER BY Id LIMIT @Limit",
                PROSPECT_COLUMNS
            ),
            vec![("@DraftYear", year.into_param()), ("@Limit", limit.into_param())],
            ProspectRow::read,
        )?;

        let mut memo = EntityMemo::new();
        let prospects = rows
            .into_iter()
            .map(|row| self.prospect_from_row(row, &mut memo))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            year,
            prospects = prospects.len(),
            teams = memo.team_count(),
            leagues = memo.league_count(),
            "listed prospects"
        );
        Ok(prospects)
    }

    pub fn get_prospect(&self, id: ProspectId) -> Result<Prospect, DbError> {
        let row = self.query_one(
            "prospect",
            format!("id={}", id),
            &format!("SELECT {} FROM Prospect WHERE Id = @Id", PROSPECT_COLUMNS),
            vec![("@Id", id.into_param())],
            ProspectRow::read,
        )?;
        self.prospect_from_row(row, &mut EntityMemo::new())
    }

    /// Look a prospect up by the configured natural key.
    pub fn get_prospect_by_key(&self, prospect: &NewProspect) -> Result<Prospect, DbError> {
        let (key, filter, params) = match self.prospect_key {
            ProspectKey::NameBirthDay => (
                format!("name={} birth_day={}", prospect.name, prospect.birth_day),
                "Name = @Name AND BirthDay = @BirthDay",
                vec![
                    ("@Name", prospect.name.as_str().into_param()),
                    ("@BirthDay", prospect.birth_day.into_param()),
                ],
            ),
            ProspectKey::NamePositionTeam => {
                let key = format!(
                    "name={} position={} team_id={}",
                    prospect.name, prospect.position, prospect.team_id
                );
                let position_id = match self.refs.position_id(&prospect.position) {
                    Ok(id) => id,
                    Err(e) if e.is_not_found() => {
                        return Err(DbError::not_found("prospect", key));
                    }
                    Err(e) => return Err(e),
                };
                (
                    key,
                    "Name = @Name AND PositionId = @PositionId AND TeamId = @TeamId",
                    vec![
                        ("@Name", prospect.name.as_str().into_param()),
                        ("@PositionId", position_id.into_param()),
                        ("@TeamId", prospect.team_id.into_param()),
                    ],
                )
            }
        };

        let row = self.query_one(
            "prospect",
            key,
            &format!(
                "SELECT {} FROM Prospect WHERE {} ORDER BY Id LIMIT 1",
                PROSPECT_COLUMNS, filter
            ),
            params,
            ProspectRow::read,
        )?;
        self.prospect_from_row(row, &mut EntityMemo::new())
    }

    /// Insert a prospect. A missing draft year is derived from the birth date.
    /// Position and handedness codes must exist in the reference tables.
    pub fn add_prospect(&self, prospect: &NewProspect) -> Result<ProspectId, DbError> {
        let position_id = self.refs.position_id(&prospect.position)?;
        let handedness_id = self.refs.handedness_id(&prospect.handedness)?;
        let draft_year = prospect.effective_draft_year();

        let id = self.insert(
            "INSERT INTO Prospect (Name, TeamId, Height, Weight, PositionId, HandednessId,
                                   BirthDay, DraftYear, BirthCity, BirthCountry, Notes)
             VALUES (@Name, @TeamId, @Height, @Weight, @PositionId, @HandednessId,
                     @BirthDay, @DraftYear, @BirthCity, @BirthCountry, @Notes)",
            vec![
                ("@Name", prospect.name.as_str().into_param()),
                ("@TeamId", prospect.team_id.into_param()),
                ("@Height", prospect.height.into_param()),
                ("@Weight", prospect.weight.into_param()),
                ("@PositionId", position_id.into_param()),
                ("@HandednessId", handedness_id.into_param()),
                ("@BirthDay", prospect.birth_day.into_param()),
                ("@DraftYear", draft_year.into_param()),
                ("@BirthCity", prospect.birth_city.as_deref().into_param()),
                ("@BirthCountry", prospect.birth_country.as_deref().into_param()),
                ("@Notes", prospect.notes.as_deref().into_param()),
            ],
        )?;
        tracing::debug!(id, name = %prospect.name, draft_year, "prospect added");
        Ok(id)
    }

    pub fn prospect_exists(&self, prospect: &NewProspect) -> Result<bool, DbError> {
        exists(self.get_prospect_by_key(prospect))
    }

    // -- Reference resolution --

    fn league_in(&self, id: LeagueId, memo: &mut EntityMemo) -> Result<League, DbError> {
        if let Some(league) = memo.leagues.get(&id) {
            return Ok(league.clone());
        }
        let league = self.get_league(id)?;
        memo.leagues.insert(id, league.clone());
        Ok(league)
    }

    fn team_in(&self, id: TeamId, memo: &mut EntityMemo) -> Result<Team, DbError> {
        if let Some(team) = memo.teams.get(&id) {
            return Ok(team.clone());
        }
        let row = self.query_one(
            "team",
            format!("id={}", id),
            "SELECT Id, Name, LeagueId FROM Team WHERE Id = @Id",
            vec![("@Id", id.into_param())],
            TeamRow::read,
        )?;
        self.team_from_row(row, memo)
    }

    fn team_from_row(&self, row: TeamRow, memo: &mut EntityMemo) -> Result<Team, DbError> {
        let team = Team {
            id: row.id,
            name: row.name,
            league: self.league_in(row.league_id, memo)?,
        };
        memo.teams.insert(team.id, team.clone());
        Ok(team)
    }

    fn prospect_from_row(&self, row: ProspectRow, memo: &mut EntityMemo) -> Result<Prospect, DbError> {
        Ok(Prospect {
            id: row.id,
            name: row.name,
            team: self.team_in(row.team_id, memo)?,
            height: row.height,
            weight: row.weight,
            position: self.refs.position_code(row.position_id)?,
            handedness: self.refs.handedness_code(row.handedness_id)?,
            birth_day: row.birth_day,
            draft_year: row.draft_year,
            birth_city: row.birth_city,
            birth_country: row.birth_country,
            notes: row.notes,
        })
    }

    // -- Command helpers --

    fn prepared(&self, sql: &str, params: Vec<(&str, Value)>) -> Result<ScopedCommand, DbError> {
        let mut cmd = self.db.command()?;
        cmd.prepare(sql)?;
        for (name, value) in params {
            cmd.bind(name, value)?;
        }
        Ok(cmd)
    }

    /// First row of a query, or `NotFound` for `entity`/`key` when there is none.
    fn query_one<T>(
        &self,
        entity: &'static str,
        key: String,
        sql: &str,
        params: Vec<(&str, Value)>,
        read: impl Fn(&ScopedCommand) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut cmd = self.prepared(sql, params)?;
        cmd.execute_query()?;
        if !cmd.next()? {
            return Err(DbError::not_found(entity, key));
        }
        let value = read(&cmd)?;
        cmd.close();
        Ok(value)
    }

    /// Drain every row, releasing the command before returning.
    fn query_all<T>(
        &self,
        sql: &str,
        params: Vec<(&str, Value)>,
        read: impl Fn(&ScopedCommand) -> Result<T, DbError>,
    ) -> Result<Vec<T>, DbError> {
        let mut cmd = self.prepared(sql, params)?;
        cmd.execute_query()?;
        let mut rows = Vec::with_capacity(cmd.row_count());
        while cmd.next()? {
            rows.push(read(&cmd)?);
        }
        cmd.close();
        Ok(rows)
    }

    fn insert(&self, sql: &str, params: Vec<(&str, Value)>) -> Result<i64, DbError> {
        let mut cmd = self.prepared(sql, params)?;
        cmd.execute_non_query(false)?;
        let id = cmd.last_insert_id()?;
        cmd.close();
        Ok(id)
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("db", &self.db)
            .field("prospect_key", &self.prospect_key)
            .finish()
    }
}
