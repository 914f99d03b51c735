use anyhow::Result;
use clap::Args;
use mockdraft_lib::{validation, Repository};

use crate::output::{print_prospects, OutputFormat};

#[derive(Args)]
pub struct ProspectsArgs {
    /// Draft year
    #[arg(long)]
    pub year: i32,

    /// Only the first N prospects (all when omitted)
    #[arg(long)]
    pub count: Option<usize>,
}

pub fn run(args: &ProspectsArgs, repo: &Repository, format: &OutputFormat) -> Result<()> {
    let year = validation::validate_draft_year(args.year)?;
    let prospects = repo.top_prospects(year, args.count)?;
    if prospects.is_empty() && *format != OutputFormat::Json {
        eprintln!("No prospects for the {} draft", year);
        return Ok(());
    }
    print_prospects(&prospects, format)
}
