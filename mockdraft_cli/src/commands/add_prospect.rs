use anyhow::Result;
use clap::Args;
use mockdraft_lib::{validation, NewProspect, Repository};

#[derive(Args)]
pub struct AddProspectArgs {
    /// Prospect's full name
    pub name: String,

    /// Current team name
    #[arg(long)]
    pub team: String,

    /// League of the current team
    #[arg(long)]
    pub league: String,

    /// Position code: C, LW, RW, D, G
    #[arg(long)]
    pub position: String,

    /// Handedness code: L or R
    #[arg(long)]
    pub shoots: String,

    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub born: String,

    /// Height in inches
    #[arg(long)]
    pub height: i32,

    /// Weight in pounds
    #[arg(long)]
    pub weight: i32,

    /// Draft year; derived from the birth date when omitted
    #[arg(long)]
    pub draft_year: Option<i32>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run(args: &AddProspectArgs, repo: &Repository) -> Result<()> {
    let league = repo.get_league_by_name(&validation::validate_name(&args.league)?)?;
    let team = repo.get_team_by_name(&validation::validate_name(&args.team)?, league.id)?;

    let prospect = NewProspect {
        name: validation::validate_name(&args.name)?,
        team_id: team.id,
        height: validation::validate_measurement(args.height, "height")?,
        weight: validation::validate_measurement(args.weight, "weight")?,
        position: validation::normalize_code(&args.position)?,
        handedness: validation::normalize_code(&args.shoots)?,
        birth_day: validation::validate_date(&args.born)?,
        draft_year: args
            .draft_year
            .map(validation::validate_draft_year)
            .transpose()?,
        birth_city: validation::validate_optional_text(args.city.as_deref())?,
        birth_country: validation::validate_optional_text(args.country.as_deref())?,
        notes: validation::validate_optional_text(args.notes.as_deref())?,
    };

    if repo.prospect_exists(&prospect)? {
        println!(
            "Prospect '{}' already exists (matched on {})",
            prospect.name,
            repo.prospect_key()
        );
        return Ok(());
    }

    let id = repo.add_prospect(&prospect)?;
    println!(
        "Added prospect '{}' to {} (id {}, {} draft)",
        prospect.name,
        team.name,
        id,
        prospect.effective_draft_year()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{add_league, add_team};
    use mockdraft_lib::{CacheRegistry, DbConfig, DbTarget};
    use tempfile::TempDir;

    fn open_test_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DbConfig::new(DbTarget::from_path(dir.path().join("cli.db")).expect("target"));
        let repo = Repository::from_config(&config, &CacheRegistry::new());
        repo.database().init().expect("init schema");
        (dir, repo)
    }

    fn args(name: &str, born: &str) -> AddProspectArgs {
        AddProspectArgs {
            name: name.to_string(),
            team: "Regina Pats".to_string(),
            league: "whl".to_string(),
            position: " c ".to_string(),
            shoots: "r".to_string(),
            born: born.to_string(),
            height: 70,
            weight: 185,
            draft_year: None,
            city: Some("North Vancouver".to_string()),
            country: Some("  ".to_string()),
            notes: None,
        }
    }

    fn seed(repo: &Repository) {
        add_league::run(&add_league::AddLeagueArgs { name: "whl".to_string() }, repo).unwrap();
        add_team::run(
            &add_team::AddTeamArgs {
                name: "Regina Pats".to_string(),
                league: "whl".to_string(),
            },
            repo,
        )
        .unwrap();
    }

    #[test]
    fn test_add_prospect_normalizes_and_derives_year() {
        let (_dir, repo) = open_test_repo();
        seed(&repo);
        run(&args("Connor Bedard", "2005-07-17"), &repo).unwrap();

        let stored = repo.list_prospects_by_draft_year(2023).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].position, "C");
        assert_eq!(stored[0].handedness, "R");
        assert_eq!(stored[0].birth_country, None);
    }

    #[test]
    fn test_add_prospect_twice_inserts_once() {
        let (_dir, repo) = open_test_repo();
        seed(&repo);
        seed(&repo);
        run(&args("Connor Bedard", "2005-07-17"), &repo).unwrap();
        run(&args("Connor Bedard", "2005-07-17"), &repo).unwrap();

        assert_eq!(repo.get_all_leagues().unwrap().len(), 1);
        assert_eq!(repo.get_all_teams().unwrap().len(), 1);
        assert_eq!(repo.list_prospects_by_draft_year(2023).unwrap().len(), 1);
    }

    #[test]
    fn test_add_prospect_rejects_bad_date() {
        let (_dir, repo) = open_test_repo();
        seed(&repo);
        assert!(run(&args("Connor Bedard", "07/17/2005"), &repo).is_err());
        assert!(repo.list_prospects_by_draft_year(2023).unwrap().is_empty());
    }

    #[test]
    fn test_add_prospect_unknown_team_fails() {
        let (_dir, repo) = open_test_repo();
        seed(&repo);
        let mut bad = args("Connor Bedard", "2005-07-17");
        bad.team = "Moose Jaw Warriors".to_string();
        let err = run(&bad, &repo).unwrap_err();
        assert!(err.to_string().contains("team not found"));
    }
}
