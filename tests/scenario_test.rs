//! Scenario lifecycle tests: clone fidelity, isolation, comparison, and
//! cache invalidation on writes.

use gridiron::storage::models::TeamStat;
use gridiron::{PlayerId, Position, ProjectionDatabase, ProjectionEngine, ScenarioId};
use std::collections::HashMap;

fn engine() -> ProjectionEngine {
    ProjectionEngine::new(ProjectionDatabase::open_in_memory().unwrap())
}

fn seed_kc(engine: &mut ProjectionEngine) {
    for season in [2023, 2024] {
        let mut stat = TeamStat {
            team_stat_id: String::new(),
            team: "KC".to_string(),
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
        };
        stat.recompute_derived();
        engine.db.upsert_team_stat(&stat).unwrap();
    }
}

async fn seed_qb_with_baseline(
    engine: &mut ProjectionEngine,
    scenario: Option<&ScenarioId>,
) -> PlayerId {
    let qb = engine
        .db
        .create_player("Scenario QB", "KC", Position::QB)
        .unwrap();
    for (stat, value) in [
        ("pass_attempts", 600.0),
        ("completions", 400.0),
        ("pass_yards", 4800.0),
        ("pass_td", 38.0),
        ("interceptions", 10.0),
        ("games", 17.0),
    ] {
        engine
            .db
            .insert_base_stat(&qb.player_id, 2023, None, stat, value)
            .unwrap();
    }
    engine
        .create_base_projection(&qb.player_id, 2024, scenario)
        .await
        .unwrap();
    qb.player_id
}

// S5: clone then diverge; the source scenario never moves.
#[tokio::test]
async fn test_clone_and_diverge() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let scenario_a = engine
        .create_scenario("Scenario A", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&scenario_a.scenario_id)).await;

    let scenario_b = engine
        .clone_scenario(&scenario_a.scenario_id, "Scenario B")
        .await
        .unwrap();
    assert_eq!(
        scenario_b.base_scenario_id.as_ref(),
        Some(&scenario_a.scenario_id)
    );

    let projection_b = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario_b.scenario_id))
        .unwrap()
        .unwrap();
    engine
        .create_override(&projection_b.projection_id, "pass_td", 45.0, None)
        .await
        .unwrap();

    let in_a = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario_a.scenario_id))
        .unwrap()
        .unwrap();
    let in_b = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario_b.scenario_id))
        .unwrap()
        .unwrap();
    assert!((in_a.pass_td.unwrap() - 38.0).abs() < 0.001);
    assert!((in_b.pass_td.unwrap() - 45.0).abs() < 0.001);
    assert!(in_b.has_overrides);
    assert!(!in_a.has_overrides);
}

// Property 6: clone fidelity for stats and overrides.
#[tokio::test]
async fn test_clone_fidelity() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let source = engine
        .create_scenario("Source", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&source.scenario_id)).await;
    let projection = engine
        .db
        .find_projection(&qb_id, 2024, Some(&source.scenario_id))
        .unwrap()
        .unwrap();
    engine
        .create_override(&projection.projection_id, "pass_td", 45.0, Some("bump".to_string()))
        .await
        .unwrap();

    let clone = engine
        .clone_scenario(&source.scenario_id, "Copy")
        .await
        .unwrap();

    let original = engine
        .db
        .find_projection(&qb_id, 2024, Some(&source.scenario_id))
        .unwrap()
        .unwrap();
    let copied = engine
        .db
        .find_projection(&qb_id, 2024, Some(&clone.scenario_id))
        .unwrap()
        .unwrap();

    assert_ne!(original.projection_id, copied.projection_id);
    for stat in [
        "pass_attempts",
        "completions",
        "pass_yards",
        "pass_td",
        "interceptions",
        "comp_pct",
        "yards_per_att",
        "pass_td_rate",
    ] {
        assert_eq!(original.stat(stat), copied.stat(stat), "stat {}", stat);
    }
    assert_eq!(original.half_ppr, copied.half_ppr);
    assert_eq!(copied.has_overrides, original.has_overrides);

    let source_overrides = engine
        .db
        .list_overrides_for_projection(&original.projection_id)
        .unwrap();
    let copied_overrides = engine
        .db
        .list_overrides_for_projection(&copied.projection_id)
        .unwrap();
    assert_eq!(copied_overrides.len(), source_overrides.len());
    assert_eq!(copied_overrides.len(), 1);
    assert_eq!(copied_overrides[0].stat_name, "pass_td");
    assert_eq!(copied_overrides[0].manual_value, 45.0);
    assert_ne!(copied_overrides[0].override_id, source_overrides[0].override_id);
}

// Property 5: mutations in one scenario never leak into another.
#[tokio::test]
async fn test_scenario_isolation_under_team_adjustment() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let scenario_a = engine
        .create_scenario("A", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&scenario_a.scenario_id)).await;
    let scenario_b = engine
        .clone_scenario(&scenario_a.scenario_id, "B")
        .await
        .unwrap();

    let factors = gridiron::engine::TeamAdjustmentFactors {
        pass_volume: 1.2,
        rush_volume: 1.0,
        pass_efficiency: 1.0,
        rush_efficiency: 1.0,
        scoring_rate: 1.0,
    };
    engine
        .apply_team_adjustments("KC", 2024, Some(&scenario_b.scenario_id), &factors)
        .await
        .unwrap();

    let in_a = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario_a.scenario_id))
        .unwrap()
        .unwrap();
    let in_b = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario_b.scenario_id))
        .unwrap()
        .unwrap();
    assert!((in_a.pass_attempts.unwrap() - 600.0).abs() < 0.01);
    assert!((in_b.pass_attempts.unwrap() - 720.0).abs() < 0.01);
}

#[tokio::test]
async fn test_compare_scenarios() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let scenario_a = engine
        .create_scenario("Base Case", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&scenario_a.scenario_id)).await;
    let scenario_b = engine
        .clone_scenario(&scenario_a.scenario_id, "More TDs")
        .await
        .unwrap();
    let projection_b = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario_b.scenario_id))
        .unwrap()
        .unwrap();
    engine
        .create_override(&projection_b.projection_id, "pass_td", 45.0, None)
        .await
        .unwrap();

    // A player present only in B.
    let te = engine
        .db
        .create_player("Only In B TE", "KC", Position::TE)
        .unwrap();
    for (stat, value) in [("targets", 100.0), ("receptions", 70.0), ("games", 17.0)] {
        engine
            .db
            .insert_base_stat(&te.player_id, 2023, None, stat, value)
            .unwrap();
    }
    engine
        .create_base_projection(&te.player_id, 2024, Some(&scenario_b.scenario_id))
        .await
        .unwrap();

    let comparison = engine
        .compare_scenarios(
            &[scenario_a.scenario_id.clone(), scenario_b.scenario_id.clone()],
            None,
        )
        .await
        .unwrap();

    assert_eq!(comparison.scenarios.len(), 2);
    assert_eq!(comparison.players.len(), 2);

    let qb_row = comparison
        .players
        .iter()
        .find(|p| p.player_id == qb_id)
        .unwrap();
    assert_eq!(qb_row.values["Base Case"]["pass_td"], 38.0);
    assert_eq!(qb_row.values["More TDs"]["pass_td"], 45.0);

    // Missing-in-scenario is an absent map, not zero-filled stats.
    let te_row = comparison
        .players
        .iter()
        .find(|p| p.player_id == te.player_id)
        .unwrap();
    assert!(!te_row.values.contains_key("Base Case"));
    assert!(te_row.values.contains_key("More TDs"));

    // Position filter narrows the player list.
    let only_te = engine
        .compare_scenarios(
            &[scenario_a.scenario_id.clone(), scenario_b.scenario_id.clone()],
            Some(Position::TE),
        )
        .await
        .unwrap();
    assert_eq!(only_te.players.len(), 1);
    assert_eq!(only_te.players[0].position, Position::TE);
}

#[tokio::test]
async fn test_compare_uses_cache_and_writes_invalidate() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let scenario = engine
        .create_scenario("Cached", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&scenario.scenario_id)).await;

    let ids = [scenario.scenario_id.clone()];
    let first = engine.compare_scenarios(&ids, None).await.unwrap();
    assert_eq!(first.players[0].values["Cached"]["pass_td"], 38.0);
    assert!(!engine.cache().is_empty());

    // A write in the scenario invalidates the cached comparison.
    let projection = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario.scenario_id))
        .unwrap()
        .unwrap();
    engine
        .create_override(&projection.projection_id, "pass_td", 41.0, None)
        .await
        .unwrap();

    let second = engine.compare_scenarios(&ids, None).await.unwrap();
    assert_eq!(second.players[0].values["Cached"]["pass_td"], 41.0);
}

#[tokio::test]
async fn test_delete_scenario_cascades() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let scenario = engine
        .create_scenario("Doomed", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&scenario.scenario_id)).await;
    let projection = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario.scenario_id))
        .unwrap()
        .unwrap();
    engine
        .create_override(&projection.projection_id, "pass_td", 41.0, None)
        .await
        .unwrap();

    engine.delete_scenario(&scenario.scenario_id).await.unwrap();

    assert!(engine.db.get_scenario(&scenario.scenario_id).unwrap().is_none());
    assert!(engine.db.get_projection(&projection.projection_id).unwrap().is_none());
    assert!(engine
        .db
        .list_overrides_for_player(&qb_id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_scenario_from_template_applies_adjustments() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let base = engine
        .create_scenario("Template Base", None, None, 2024, None)
        .await
        .unwrap();
    let qb_id = seed_qb_with_baseline(&mut engine, Some(&base.scenario_id)).await;

    let mut global = HashMap::new();
    global.insert("pass_volume".to_string(), 1.1);
    let mut per_player = HashMap::new();
    let mut qb_factors = HashMap::new();
    qb_factors.insert("td_rate".to_string(), 1.2);
    per_player.insert(qb_id.clone(), qb_factors);

    let scenario = engine
        .create_scenario_from_template("Aggressive", &base.scenario_id, &global, &per_player)
        .await
        .unwrap();

    let projection = engine
        .db
        .find_projection(&qb_id, 2024, Some(&scenario.scenario_id))
        .unwrap()
        .unwrap();
    assert!((projection.pass_attempts.unwrap() - 660.0).abs() < 0.01);
    assert!((projection.pass_td.unwrap() - 38.0 * 1.2).abs() < 0.01);

    // The base scenario never moved.
    let base_projection = engine
        .db
        .find_projection(&qb_id, 2024, Some(&base.scenario_id))
        .unwrap()
        .unwrap();
    assert!((base_projection.pass_attempts.unwrap() - 600.0).abs() < 0.01);
}

#[tokio::test]
async fn test_batch_create_scenarios_reports_failures() {
    let mut engine = engine();
    seed_kc(&mut engine);

    let base = engine
        .create_scenario("Batch Base", None, None, 2024, None)
        .await
        .unwrap();
    seed_qb_with_baseline(&mut engine, Some(&base.scenario_id)).await;

    let templates = vec![
        gridiron::engine::ScenarioTemplate {
            name: "Good".to_string(),
            base_scenario_id: base.scenario_id.clone(),
            global_adjustments: HashMap::new(),
            player_adjustments: HashMap::new(),
        },
        gridiron::engine::ScenarioTemplate {
            name: "Bad".to_string(),
            base_scenario_id: ScenarioId::new("does-not-exist"),
            global_adjustments: HashMap::new(),
            player_adjustments: HashMap::new(),
        },
    ];

    let outcome = engine.batch_create_scenarios(&templates, None).await.unwrap();
    assert_eq!(outcome.succeeded.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].key, "Bad");
    assert!(!outcome.cancelled);
}
