//! Integration tests for the repository over a file-backed database.

use std::sync::Arc;

use chrono::NaiveDate;
use mockdraft_lib::{
    CommandOptions, Database, DbError, DbTarget, NewLeague, NewProspect, NewTeam, ProspectKey,
    ReferenceCache, ReferenceTable, Repository, TeamId,
};
use tempfile::TempDir;

fn setup_repo() -> (TempDir, Repository) {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = DbTarget::from_path(dir.path().join("mockdraft.db")).expect("target");
    let db = Database::new(target, CommandOptions::default());
    db.init().expect("init db");
    let refs = Arc::new(ReferenceCache::new(db.clone()));
    (dir, Repository::new(db, refs))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn new_prospect(name: &str, team_id: TeamId, birth_day: NaiveDate) -> NewProspect {
    NewProspect {
        name: name.to_string(),
        team_id,
        height: 73,
        weight: 190,
        position: "C".to_string(),
        handedness: "L".to_string(),
        birth_day,
        draft_year: None,
        birth_city: None,
        birth_country: Some("CAN".to_string()),
        notes: None,
    }
}

/// Two leagues, three teams: (London, OHL), (Kitchener, OHL), (Regina, WHL).
fn seed_teams(repo: &Repository) -> [TeamId; 3] {
    let ohl = repo.add_league(&NewLeague::new("OHL")).expect("add OHL");
    let whl = repo.add_league(&NewLeague::new("WHL")).expect("add WHL");
    [
        repo.add_team(&NewTeam::new("London Knights", ohl)).expect("add team"),
        repo.add_team(&NewTeam::new("Kitchener Rangers", ohl)).expect("add team"),
        repo.add_team(&NewTeam::new("Regina Pats", whl)).expect("add team"),
    ]
}

fn warm_reference_cache(repo: &Repository) {
    for table in ReferenceTable::ALL {
        repo.references().codes(table).expect("load codes");
    }
}

#[test]
fn test_draft_year_derived_on_cutoff_day() {
    let (_dir, repo) = setup_repo();
    let [team, _, _] = seed_teams(&repo);

    let on_cutoff = repo
        .add_prospect(&new_prospect("On Cutoff", team, date(2005, 8, 15)))
        .unwrap();
    let after_cutoff = repo
        .add_prospect(&new_prospect("After Cutoff", team, date(2005, 8, 16)))
        .unwrap();

    assert_eq!(repo.get_prospect(on_cutoff).unwrap().draft_year, 2023);
    assert_eq!(repo.get_prospect(after_cutoff).unwrap().draft_year, 2024);
}

#[test]
fn test_list_by_year_filters_exactly() {
    let (_dir, repo) = setup_repo();
    let [london, kitchener, regina] = seed_teams(&repo);

    repo.add_prospect(&new_prospect("A", london, date(2005, 1, 10))).unwrap();
    repo.add_prospect(&new_prospect("B", regina, date(2005, 9, 1))).unwrap();
    repo.add_prospect(&new_prospect("C", kitchener, date(2005, 3, 3))).unwrap();
    repo.add_prospect(&new_prospect("D", london, date(2004, 6, 30))).unwrap();

    let names: Vec<String> = repo
        .list_prospects_by_draft_year(2023)
        .unwrap()
        .into_iter()
        .map(|p| {
            assert_eq!(p.draft_year, 2023);
            p.name
        })
        .collect();
    assert_eq!(names, vec!["A", "C"]);

    let next_year = repo.list_prospects_by_draft_year(2024).unwrap();
    assert_eq!(next_year.len(), 1);
    assert_eq!(next_year[0].team.league.name, "WHL");

    assert!(repo.list_prospects_by_draft_year(1990).unwrap().is_empty());
}

#[test]
fn test_list_order_is_stable() {
    let (_dir, repo) = setup_repo();
    let [london, _, regina] = seed_teams(&repo);
    for (i, team) in [london, regina, london, regina].into_iter().enumerate() {
        repo.add_prospect(&new_prospect(&format!("P{}", i), team, date(2005, 5, 5)))
            .unwrap();
    }

    let first = repo.list_prospects_by_draft_year(2023).unwrap();
    let second = repo.list_prospects_by_draft_year(2023).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_batch_fetch_resolves_each_team_once() {
    let (_dir, repo) = setup_repo();
    let [london, _, _] = seed_teams(&repo);
    for i in 0..6 {
        repo.add_prospect(&new_prospect(&format!("Knight {}", i), london, date(2005, 2, i + 1)))
            .unwrap();
    }
    warm_reference_cache(&repo);

    let before = repo.database().stats().summary();
    let prospects = repo.list_prospects_by_draft_year(2023).unwrap();
    let delta = repo.database().stats().summary().since(&before);

    assert_eq!(prospects.len(), 6);
    assert!(prospects.iter().all(|p| p.team.name == "London Knights"));
    // One prospect query, one team lookup, one league lookup.
    assert_eq!(delta.queries, 3);
    assert_eq!(delta.commands_opened, 3);
}

#[test]
fn test_batch_fetch_shares_league_between_teams() {
    let (_dir, repo) = setup_repo();
    let [london, kitchener, _] = seed_teams(&repo);
    for i in 0..4 {
        let team = if i % 2 == 0 { london } else { kitchener };
        repo.add_prospect(&new_prospect(&format!("OHL {}", i), team, date(2005, 4, i + 1)))
            .unwrap();
    }
    warm_reference_cache(&repo);

    let before = repo.database().stats().summary();
    repo.list_prospects_by_draft_year(2023).unwrap();
    let delta = repo.database().stats().summary().since(&before);

    // Prospects, two teams, one shared league.
    assert_eq!(delta.queries, 4);
}

#[test]
fn test_memo_does_not_span_calls() {
    let (_dir, repo) = setup_repo();
    let [london, _, _] = seed_teams(&repo);
    repo.add_prospect(&new_prospect("Solo", london, date(2005, 6, 6))).unwrap();
    warm_reference_cache(&repo);

    let before = repo.database().stats().summary();
    repo.list_prospects_by_draft_year(2023).unwrap();
    repo.list_prospects_by_draft_year(2023).unwrap();
    let delta = repo.database().stats().summary().since(&before);
    assert_eq!(delta.queries, 6);
}

#[test]
fn test_cold_cache_loads_each_reference_table_once() {
    let (_dir, repo) = setup_repo();
    let [london, _, regina] = seed_teams(&repo);
    for i in 0..3 {
        repo.add_prospect(&new_prospect(&format!("X{}", i), london, date(2005, 1, i + 1)))
            .unwrap();
        repo.add_prospect(&new_prospect(&format!("Y{}", i), regina, date(2005, 2, i + 1)))
            .unwrap();
    }

    // add_prospect already loaded both tables through this repository's cache.
    let fresh = Repository::new(
        repo.database().clone(),
        Arc::new(ReferenceCache::new(repo.database().clone())),
    );
    let before = fresh.database().stats().summary();
    fresh.list_prospects_by_draft_year(2023).unwrap();
    let delta = fresh.database().stats().summary().since(&before);

    // Prospects, two teams, two leagues, position and handedness tables.
    assert_eq!(delta.queries, 7);
}

#[test]
fn test_exists_false_for_absent_inputs() {
    let (_dir, repo) = setup_repo();
    let [london, _, _] = seed_teams(&repo);

    assert!(!repo.league_name_exists("KHL").unwrap());
    assert!(!repo.team_exists("London Knights", 9_999).unwrap());
    assert!(!repo.team_exists("Ottawa 67's", 1).unwrap());
    assert!(!repo
        .prospect_exists(&new_prospect("Nobody", london, date(2005, 1, 1)))
        .unwrap());

    let position_team = Repository::new(
        repo.database().clone(),
        Arc::new(ReferenceCache::new(repo.database().clone())),
    )
    .with_prospect_key(ProspectKey::NamePositionTeam);
    assert!(!position_team
        .prospect_exists(&new_prospect("Nobody", london, date(2005, 1, 1)))
        .unwrap());
}

#[test]
fn test_point_lookups_report_not_found() {
    let (_dir, repo) = setup_repo();
    assert!(matches!(
        repo.get_league_by_name("KHL"),
        Err(DbError::NotFound { entity: "league", .. })
    ));
    assert!(matches!(
        repo.get_team(42),
        Err(DbError::NotFound { entity: "team", .. })
    ));
    assert!(matches!(
        repo.get_prospect(42),
        Err(DbError::NotFound { entity: "prospect", .. })
    ));
}

#[test]
fn test_prospect_requires_existing_team() {
    let (_dir, repo) = setup_repo();
    let err = repo
        .add_prospect(&new_prospect("Ghost", 404, date(2005, 1, 1)))
        .unwrap_err();
    assert!(matches!(err, DbError::Execution { .. }));
}

#[test]
fn test_get_all_leagues_and_teams() {
    let (_dir, repo) = setup_repo();
    seed_teams(&repo);

    let leagues = repo.get_all_leagues().unwrap();
    assert_eq!(
        leagues.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
        vec!["OHL", "WHL"]
    );

    let teams = repo.get_all_teams().unwrap();
    assert_eq!(teams.len(), 3);
    assert_eq!(teams[0].league, teams[1].league);
    assert_eq!(teams[2].league.name, "WHL");
}
