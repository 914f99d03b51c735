mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mockdraft_lib::{CacheRegistry, DbConfig, Repository};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "mockdraft")]
#[command(about = "Track hockey draft prospects, teams and leagues")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// SQLite database file (overrides MOCKDRAFT_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed the reference tables
    Init(commands::init::InitArgs),
    /// List leagues
    Leagues(commands::leagues::LeaguesArgs),
    /// List teams
    Teams(commands::teams::TeamsArgs),
    /// Add a league unless it already exists
    AddLeague(commands::add_league::AddLeagueArgs),
    /// Add a team unless it already exists
    AddTeam(commands::add_team::AddTeamArgs),
    /// Add a prospect unless it already exists
    AddProspect(Box<commands::add_prospect::AddProspectArgs>),
    /// List prospects for a draft year
    Prospects(commands::prospects::ProspectsArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mockdraft=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    let config = DbConfig::from_env_with_target(cli.db.as_deref())?;
    let registry = CacheRegistry::new();
    let repo = Repository::from_config(&config, &registry);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &repo)?,
        Commands::Leagues(args) => commands::leagues::run(args, &repo, &format)?,
        Commands::Teams(args) => commands::teams::run(args, &repo, &format)?,
        Commands::AddLeague(args) => commands::add_league::run(args, &repo)?,
        Commands::AddTeam(args) => commands::add_team::run(args, &repo)?,
        Commands::AddProspect(args) => commands::add_prospect::run(args.as_ref(), &repo)?,
        Commands::Prospects(args) => commands::prospects::run(args, &repo, &format)?,
    }

    tracing::debug!(stats = ?repo.database().stats().summary(), "database commands");
    Ok(())
}
