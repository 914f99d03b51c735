use anyhow::Result;
use mockdraft_lib::{League, Prospect, Team};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "markdown" | "md" => Self::Markdown,
            _ => Self::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct LeagueRow {
    #[tabled(rename = "Id")]
    #[serde(rename = "Id")]
    id: i64,
    #[tabled(rename = "League")]
    #[serde(rename = "League")]
    name: String,
}

#[derive(Tabled, Serialize)]
struct TeamRow {
    #[tabled(rename = "Id")]
    #[serde(rename = "Id")]
    id: i64,
    #[tabled(rename = "Team")]
    #[serde(rename = "Team")]
    name: String,
    #[tabled(rename = "League")]
    #[serde(rename = "League")]
    league: String,
}

#[derive(Tabled, Serialize)]
struct ProspectRow {
    #[tabled(rename = "Rank")]
    #[serde(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Pos")]
    #[serde(rename = "Pos")]
    position: String,
    #[tabled(rename = "Shoots")]
    #[serde(rename = "Shoots")]
    handedness: String,
    #[tabled(rename = "Team")]
    #[serde(rename = "Team")]
    team: String,
    #[tabled(rename = "League")]
    #[serde(rename = "League")]
    league: String,
    #[tabled(rename = "Height")]
    #[serde(rename = "Height")]
    height: String,
    #[tabled(rename = "Weight")]
    #[serde(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Born")]
    #[serde(rename = "Born")]
    birth_day: String,
    #[tabled(rename = "Birthplace")]
    #[serde(rename = "Birthplace")]
    birthplace: String,
}

// -- Row builders --

fn build_league_rows(leagues: &[League]) -> Vec<LeagueRow> {
    leagues
        .iter()
        .map(|l| LeagueRow {
            id: l.id,
            name: l.name.clone(),
        })
        .collect()
}

fn build_team_rows(teams: &[Team]) -> Vec<TeamRow> {
    teams
        .iter()
        .map(|t| TeamRow {
            id: t.id,
            name: t.name.clone(),
            league: t.league.name.clone(),
        })
        .collect()
}

fn build_prospect_rows(prospects: &[Prospect]) -> Vec<ProspectRow> {
    prospects
        .iter()
        .enumerate()
        .map(|(i, p)| ProspectRow {
            rank: i + 1,
            name: p.name.clone(),
            position: p.position.clone(),
            handedness: p.handedness.clone(),
            team: p.team.name.clone(),
            league: p.team.league.name.clone(),
            height: format_height(p.height),
            weight: format!("{} lb", p.weight),
            birth_day: p.birth_day.to_string(),
            birthplace: format_birthplace(p.birth_city.as_deref(), p.birth_country.as_deref()),
        })
        .collect()
}

// -- Printers --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_leagues(leagues: &[League], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&leagues);
            Ok(())
        }
        _ => print_rows(build_league_rows(leagues), format),
    }
}

pub fn print_teams(teams: &[Team], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&teams);
            Ok(())
        }
        _ => print_rows(build_team_rows(teams), format),
    }
}

/// JSON output is the camelCase prospect list served to the web front end.
pub fn print_prospects(prospects: &[Prospect], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&prospects);
            Ok(())
        }
        _ => print_rows(build_prospect_rows(prospects), format),
    }
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

/// Inches as feet and inches, e.g. `6'1"`.
fn format_height(inches: i32) -> String {
    if inches <= 0 {
        return "-".to_string();
    }
    format!("{}'{}\"", inches / 12, inches % 12)
}

fn format_birthplace(city: Option<&str>, country: Option<&str>) -> String {
    match (city, country) {
        (Some(city), Some(country)) => format!("{}, {}", city, country),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (None, None) => String::new(),
    }
}
