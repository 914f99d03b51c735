use anyhow::Result;
use clap::Args;
use mockdraft_lib::{ReferenceTable, Repository};

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs, repo: &Repository) -> Result<()> {
    repo.database().init()?;
    let positions = repo.references().codes(ReferenceTable::Position)?;
    let hands = repo.references().codes(ReferenceTable::Handedness)?;
    println!("Initialised {}", repo.database().target());
    println!("  positions:  {}", positions.join(", "));
    println!("  handedness: {}", hands.join(", "));
    Ok(())
}
