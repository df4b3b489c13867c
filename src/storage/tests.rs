//! Unit tests for storage functionality

use super::*;
use crate::types::{Position, ProjectionId};

fn create_test_db() -> ProjectionDatabase {
    ProjectionDatabase::open_in_memory().unwrap()
}

fn create_test_db_with_player() -> (ProjectionDatabase, Player) {
    let mut db = create_test_db();
    let player = db.create_player("Test Quarterback", "KC", Position::QB).unwrap();
    (db, player)
}

fn sample_team_stat(team: &str, season: u16) -> TeamStat {
    TeamStat {
        team_stat_id: String::new(),
        team: team.to_string(),
        season,
        week: None,
        plays: 1000.0,
        pass_attempts: 600.0,
        pass_yards: 4250.0,
        pass_td: 30.0,
        rush_attempts: 400.0,
        rush_yards: 1600.0,
        rush_td: 19.0,
        targets: 600.0,
        receptions: 390.0,
        rec_yards: 4250.0,
        rec_td: 30.0,
        rank: Some(1),
        pass_percentage: 0.0,
        pass_td_rate: 0.0,
        rush_yards_per_carry: 0.0,
        created_at: 0,
        updated_at: 0,
    }
}

#[test]
fn test_database_creation() {
    let _db = create_test_db();
    // Should not panic - schema initialization successful
}

#[test]
fn test_create_and_get_player() {
    let (db, player) = create_test_db_with_player();
    let fetched = db.get_player(&player.player_id).unwrap().unwrap();
    assert_eq!(fetched.name, "Test Quarterback");
    assert_eq!(fetched.team, "KC");
    assert_eq!(fetched.position, Position::QB);
    assert!(!fetched.is_fill_player);
}

#[test]
fn test_upsert_player_updates() {
    let (mut db, mut player) = create_test_db_with_player();
    player.team = "BUF".to_string();
    db.upsert_player(&player).unwrap();

    let fetched = db.get_player(&player.player_id).unwrap().unwrap();
    assert_eq!(fetched.team, "BUF");
}

#[test]
fn test_list_players_filters() {
    let mut db = create_test_db();
    db.create_player("QB One", "KC", Position::QB).unwrap();
    db.create_player("TE One", "KC", Position::TE).unwrap();
    db.create_player("WR One", "BUF", Position::WR).unwrap();

    assert_eq!(db.list_players(None, None).unwrap().len(), 3);
    assert_eq!(db.list_players(Some("KC"), None).unwrap().len(), 2);
    assert_eq!(
        db.list_players(Some("KC"), Some(Position::TE)).unwrap().len(),
        1
    );
    assert!(db.list_players(Some("NYJ"), None).unwrap().is_empty());
}

#[test]
fn test_team_stat_roundtrip_and_derived() {
    let mut db = create_test_db();
    let stat = db.upsert_team_stat(&sample_team_stat("KC", 2024)).unwrap();
    assert!(!stat.team_stat_id.is_empty());

    let fetched = db.get_team_stat("KC", 2024).unwrap().unwrap();
    assert!((fetched.pass_percentage - 0.6).abs() < 1e-9);
    assert!((fetched.pass_td_rate - 0.05).abs() < 1e-9);
    assert!((fetched.rush_yards_per_carry - 4.0).abs() < 1e-9);
    assert!(db.get_team_stat("KC", 2023).unwrap().is_none());
}

#[test]
fn test_base_stats_season_and_game_values() {
    let (mut db, player) = create_test_db_with_player();

    db.insert_base_stat(&player.player_id, 2023, None, "pass_attempts", 580.0)
        .unwrap();
    db.insert_base_stat(&player.player_id, 2023, None, "games", 16.0)
        .unwrap();
    for week in 1..=10u16 {
        db.insert_base_stat(&player.player_id, 2023, Some(week), "pass_yards", 250.0 + week as f64)
            .unwrap();
    }

    let season = db.get_season_stats(&player.player_id, 2023).unwrap();
    assert_eq!(season["pass_attempts"], 580.0);
    assert_eq!(season["games"], 16.0);
    // Week rows are excluded from season totals.
    assert!(!season.contains_key("pass_yards"));

    let games = db
        .get_game_values(&player.player_id, "pass_yards", 2021, 2023)
        .unwrap();
    assert_eq!(games.len(), 10);
    assert_eq!(games[0], 251.0);
}

#[test]
fn test_projection_insert_find_save() {
    let (mut db, player) = create_test_db_with_player();

    let mut projection = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        None,
        2024,
        17,
    );
    projection.pass_attempts = Some(600.0);
    projection.half_ppr = 300.0;
    db.insert_projection(&mut projection).unwrap();
    assert!(!projection.projection_id.as_str().is_empty());

    let fetched = db
        .find_projection(&player.player_id, 2024, None)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.pass_attempts, Some(600.0));
    assert!(fetched.scenario_id.is_none());

    let mut updated = fetched.clone();
    updated.pass_attempts = Some(650.0);
    db.save_projection(&mut updated).unwrap();
    let refetched = db.get_projection(&updated.projection_id).unwrap().unwrap();
    assert_eq!(refetched.pass_attempts, Some(650.0));
    assert!(refetched.updated_at >= fetched.updated_at);
}

#[test]
fn test_find_projection_distinguishes_scenario() {
    let (mut db, player) = create_test_db_with_player();
    let scenario = db
        .insert_scenario("What if", None, None, 2024, None)
        .unwrap();

    let mut baseline = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        None,
        2024,
        17,
    );
    baseline.half_ppr = 300.0;
    db.insert_projection(&mut baseline).unwrap();

    let mut branched = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        Some(scenario.scenario_id.clone()),
        2024,
        17,
    );
    branched.half_ppr = 320.0;
    db.insert_projection(&mut branched).unwrap();

    let found_baseline = db
        .find_projection(&player.player_id, 2024, None)
        .unwrap()
        .unwrap();
    assert_eq!(found_baseline.half_ppr, 300.0);

    let found_branch = db
        .find_projection(&player.player_id, 2024, Some(&scenario.scenario_id))
        .unwrap()
        .unwrap();
    assert_eq!(found_branch.half_ppr, 320.0);
}

#[test]
fn test_list_projections_half_ppr_filter() {
    let (mut db, player) = create_test_db_with_player();
    let other = db.create_player("Test Tight End", "KC", Position::TE).unwrap();

    let mut high = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        None,
        2024,
        17,
    );
    high.half_ppr = 350.0;
    db.insert_projection(&mut high).unwrap();

    let mut low = Projection::blank(
        ProjectionId::new(""),
        other.player_id.clone(),
        None,
        2024,
        17,
    );
    low.half_ppr = 120.0;
    db.insert_projection(&mut low).unwrap();

    let filter = ProjectionFilter {
        season: Some(2024),
        half_ppr_min: Some(200.0),
        ..Default::default()
    };
    let results = db.list_projections(&filter).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].1.name, "Test Quarterback");

    let filter = ProjectionFilter {
        season: Some(2024),
        position: Some(Position::TE),
        ..Default::default()
    };
    let results = db.list_projections(&filter).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.half_ppr, 120.0);
}

#[test]
fn test_scenario_clone_and_cascade_delete() {
    let (mut db, player) = create_test_db_with_player();
    let source = db.insert_scenario("Source", None, None, 2024, None).unwrap();
    let target = db
        .insert_scenario("Copy", None, Some(&source.scenario_id), 2024, None)
        .unwrap();

    let mut projection = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        Some(source.scenario_id.clone()),
        2024,
        17,
    );
    projection.pass_attempts = Some(600.0);
    projection.has_overrides = true;
    db.insert_projection(&mut projection).unwrap();

    let mut override_row = StatOverride {
        override_id: crate::types::OverrideId::new(""),
        player_id: player.player_id.clone(),
        projection_id: projection.projection_id.clone(),
        stat_name: "pass_attempts".to_string(),
        calculated_value: 580.0,
        manual_value: 600.0,
        notes: None,
        created_at: 0,
    };
    db.apply_override(&mut projection, &mut override_row).unwrap();

    let copied = db
        .clone_scenario_rows(&source.scenario_id, &target.scenario_id)
        .unwrap();
    assert_eq!(copied, 1);

    let clones = db
        .projections_for_team("KC", 2024, Some(&target.scenario_id))
        .unwrap();
    assert_eq!(clones.len(), 1);
    let clone = &clones[0].0;
    assert_ne!(clone.projection_id, projection.projection_id);
    assert_eq!(clone.pass_attempts, Some(600.0));
    assert!(clone.has_overrides);

    let cloned_overrides = db.list_overrides_for_projection(&clone.projection_id).unwrap();
    assert_eq!(cloned_overrides.len(), 1);
    assert_eq!(cloned_overrides[0].manual_value, 600.0);
    assert_ne!(cloned_overrides[0].override_id, override_row.override_id);

    // Cascade delete removes projections and overrides.
    db.delete_scenario_cascade(&target.scenario_id).unwrap();
    assert!(db.get_scenario(&target.scenario_id).unwrap().is_none());
    assert!(db
        .projections_for_team("KC", 2024, Some(&target.scenario_id))
        .unwrap()
        .is_empty());
    // Source rows untouched.
    assert_eq!(
        db.projections_for_team("KC", 2024, Some(&source.scenario_id))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_override_replace_on_conflict() {
    let (mut db, player) = create_test_db_with_player();
    let mut projection = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        None,
        2024,
        17,
    );
    db.insert_projection(&mut projection).unwrap();

    let mut first = StatOverride {
        override_id: crate::types::OverrideId::new(""),
        player_id: player.player_id.clone(),
        projection_id: projection.projection_id.clone(),
        stat_name: "pass_attempts".to_string(),
        calculated_value: 580.0,
        manual_value: 600.0,
        notes: None,
        created_at: 0,
    };
    db.apply_override(&mut projection, &mut first).unwrap();

    let mut second = StatOverride {
        override_id: crate::types::OverrideId::new(""),
        player_id: player.player_id.clone(),
        projection_id: projection.projection_id.clone(),
        stat_name: "pass_attempts".to_string(),
        calculated_value: 580.0,
        manual_value: 650.0,
        notes: Some("bumped".to_string()),
        created_at: 0,
    };
    db.apply_override(&mut projection, &mut second).unwrap();

    // Still exactly one row for the (projection, stat) pair.
    assert_eq!(db.count_overrides(&projection.projection_id).unwrap(), 1);
    let row = db
        .find_override(&projection.projection_id, "pass_attempts")
        .unwrap()
        .unwrap();
    assert_eq!(row.manual_value, 650.0);
    // Replaced in place: the original id survives.
    assert_eq!(row.override_id, first.override_id);
}

#[test]
fn test_rebuild_projection_drops_overrides() {
    let (mut db, player) = create_test_db_with_player();
    let mut projection = Projection::blank(
        ProjectionId::new(""),
        player.player_id.clone(),
        None,
        2024,
        17,
    );
    projection.pass_attempts = Some(650.0);
    projection.has_overrides = true;
    db.insert_projection(&mut projection).unwrap();

    let mut override_row = StatOverride {
        override_id: crate::types::OverrideId::new(""),
        player_id: player.player_id.clone(),
        projection_id: projection.projection_id.clone(),
        stat_name: "pass_attempts".to_string(),
        calculated_value: 600.0,
        manual_value: 650.0,
        notes: None,
        created_at: 0,
    };
    db.apply_override(&mut projection, &mut override_row).unwrap();
    assert_eq!(db.count_overrides(&projection.projection_id).unwrap(), 1);

    let mut rebuilt = Projection::blank(
        projection.projection_id.clone(),
        player.player_id.clone(),
        None,
        2024,
        17,
    );
    rebuilt.pass_attempts = Some(580.0);
    let cleared = db.rebuild_projection(&mut rebuilt).unwrap();
    assert_eq!(cleared, 1);

    let fetched = db.get_projection(&projection.projection_id).unwrap().unwrap();
    assert_eq!(fetched.pass_attempts, Some(580.0));
    assert!(!fetched.has_overrides);
    assert_eq!(db.count_overrides(&projection.projection_id).unwrap(), 0);
}

#[test]
fn test_delete_fill_projections_scoped() {
    let mut db = create_test_db();
    let mut fill = db.create_player("KC Fill QB", "KC", Position::QB).unwrap();
    fill.is_fill_player = true;
    db.upsert_player(&fill).unwrap();
    let regular = db.create_player("Real QB", "KC", Position::QB).unwrap();

    let mut fill_projection = Projection::blank(
        ProjectionId::new(""),
        fill.player_id.clone(),
        None,
        2024,
        17,
    );
    fill_projection.is_fill_player = true;
    db.insert_projection(&mut fill_projection).unwrap();

    let mut real_projection = Projection::blank(
        ProjectionId::new(""),
        regular.player_id.clone(),
        None,
        2024,
        17,
    );
    db.insert_projection(&mut real_projection).unwrap();

    let deleted = db.delete_fill_projections("KC", 2024, None).unwrap();
    assert_eq!(deleted, 1);
    assert!(db.get_projection(&fill_projection.projection_id).unwrap().is_none());
    assert!(db.get_projection(&real_projection.projection_id).unwrap().is_some());
}

#[test]
fn test_open_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projections.db");
    {
        let mut db = ProjectionDatabase::open(&path).unwrap();
        db.create_player("Disk QB", "KC", Position::QB).unwrap();
    }
    let db = ProjectionDatabase::open(&path).unwrap();
    assert_eq!(db.list_players(Some("KC"), None).unwrap().len(), 1);
}

#[test]
fn test_find_fill_player() {
    let mut db = create_test_db();
    assert!(db.find_fill_player("KC", Position::QB).unwrap().is_none());
    let mut fill = db.create_player("KC Fill QB", "KC", Position::QB).unwrap();
    fill.is_fill_player = true;
    db.upsert_player(&fill).unwrap();
    let found = db.find_fill_player("KC", Position::QB).unwrap().unwrap();
    assert_eq!(found.player_id, fill.player_id);
}
