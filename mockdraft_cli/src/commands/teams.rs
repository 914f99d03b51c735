use anyhow::Result;
use clap::Args;
use mockdraft_lib::{validation, Repository};

use crate::output::{print_teams, OutputFormat};

#[derive(Args)]
pub struct TeamsArgs {
    /// Only teams in this league
    #[arg(long)]
    pub league: Option<String>,
}

pub fn run(args: &TeamsArgs, repo: &Repository, format: &OutputFormat) -> Result<()> {
    let mut teams = repo.get_all_teams()?;
    if let Some(ref league) = args.league {
        let league = repo.get_league_by_name(&validation::validate_name(league)?)?;
        teams.retain(|t| t.league.id == league.id);
    }
    print_teams(&teams, format)
}
