use anyhow::Result;
use clap::Args;
use mockdraft_lib::{validation, Repository};

use crate::output::{print_leagues, OutputFormat};

#[derive(Args)]
pub struct LeaguesArgs {
    /// Show a single league by name
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: &LeaguesArgs, repo: &Repository, format: &OutputFormat) -> Result<()> {
    let leagues = match &args.name {
        Some(name) => vec![repo.get_league_by_name(&validation::validate_name(name)?)?],
        None => repo.get_all_leagues()?,
    };
    print_leagues(&leagues, format)
}
