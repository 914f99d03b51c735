use anyhow::Result;
use clap::Args;
use mockdraft_lib::{validation, NewTeam, Repository};

#[derive(Args)]
pub struct AddTeamArgs {
    /// Team name
    pub name: String,

    /// Name of the league the team plays in
    #[arg(long)]
    pub league: String,
}

pub fn run(args: &AddTeamArgs, repo: &Repository) -> Result<()> {
    let name = validation::validate_name(&args.name)?;
    let league = repo.get_league_by_name(&validation::validate_name(&args.league)?)?;

    if repo.team_exists(&name, league.id)? {
        println!("Team '{}' already exists in {}", name, league.name);
        return Ok(());
    }
    let id = repo.add_team(&NewTeam::new(name.clone(), league.id))?;
    println!("Added team '{}' to {} (id {})", name, league.name, id);
    Ok(())
}
