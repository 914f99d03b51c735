use anyhow::Result;
use clap::Args;
use mockdraft_lib::{validation, NewLeague, Repository};

#[derive(Args)]
pub struct AddLeagueArgs {
    /// League name (e.g. OHL, WHL, SHL)
    pub name: String,
}

pub fn run(args: &AddLeagueArgs, repo: &Repository) -> Result<()> {
    let name = validation::validate_name(&args.name)?;
    if repo.league_name_exists(&name)? {
        println!("League '{}' already exists", name);
        return Ok(());
    }
    let id = repo.add_league(&NewLeague::new(name.clone()))?;
    println!("Added league '{}' (id {})", name, id);
    Ok(())
}
