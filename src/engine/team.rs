//! Team-level adjustments propagated to every affected player.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::rates;
use crate::storage::models::{Projection, TeamStat};
use crate::types::{Position, ScenarioId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Factor bundle describing how a team's offense changed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TeamAdjustmentFactors {
    pub pass_volume: f64,
    pub rush_volume: f64,
    pub pass_efficiency: f64,
    pub rush_efficiency: f64,
    pub scoring_rate: f64,
}

impl TeamAdjustmentFactors {
    /// The identity bundle: no change.
    pub fn identity() -> Self {
        Self {
            pass_volume: 1.0,
            rush_volume: 1.0,
            pass_efficiency: 1.0,
            rush_efficiency: 1.0,
            scoring_rate: 1.0,
        }
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        1.0
    }
}

/// Compute the factor bundle between two team stat lines.
///
/// Efficiency factors compare per-attempt production so volume and
/// efficiency changes separate cleanly; the scoring factor pools passing
/// and rushing touchdowns.
pub fn calculate_team_adjustment_factors(
    original: &TeamStat,
    new: &TeamStat,
) -> TeamAdjustmentFactors {
    let pass_volume = safe_ratio(new.pass_attempts, original.pass_attempts);
    let rush_volume = safe_ratio(new.rush_attempts, original.rush_attempts);
    let orig_ypa = safe_ratio(original.pass_yards, original.pass_attempts);
    let new_ypa = safe_ratio(new.pass_yards, new.pass_attempts);
    let orig_ypc = safe_ratio(original.rush_yards, original.rush_attempts);
    let new_ypc = safe_ratio(new.rush_yards, new.rush_attempts);

    TeamAdjustmentFactors {
        pass_volume,
        rush_volume,
        pass_efficiency: safe_ratio(new_ypa, orig_ypa),
        rush_efficiency: safe_ratio(new_ypc, orig_ypc),
        scoring_rate: safe_ratio(new.pass_td + new.rush_td, original.pass_td + original.rush_td),
    }
}

/// Apply a factor bundle to one projection, scaling from the given
/// snapshot. Position decides which factors reach which stats:
///
/// - QB carries the passing volume: attempts/completions scale with pass
///   volume, yards additionally with pass efficiency, and rushing with the
///   rush factors.
/// - RB rushing scales with rush volume x efficiency; RB receiving follows
///   team pass volume.
/// - WR/TE receiving follows pass volume, yards additionally with pass
///   efficiency.
/// - All touchdowns follow the pooled scoring rate.
pub fn apply_factors(
    snapshot: &Projection,
    position: Position,
    factors: &TeamAdjustmentFactors,
) -> Projection {
    let mut adjusted = snapshot.clone();
    let scale = |value: Option<f64>, factor: f64| value.map(|v| v * factor);

    match position {
        Position::QB => {
            adjusted.pass_attempts = scale(snapshot.pass_attempts, factors.pass_volume);
            adjusted.completions = scale(snapshot.completions, factors.pass_volume);
            adjusted.pass_yards = scale(
                snapshot.pass_yards,
                factors.pass_volume * factors.pass_efficiency,
            );
            adjusted.sacks = scale(snapshot.sacks, factors.pass_volume);
            adjusted.sack_yards = scale(snapshot.sack_yards, factors.pass_volume);
            adjusted.interceptions = scale(snapshot.interceptions, factors.pass_volume);
            adjusted.pass_td = scale(snapshot.pass_td, factors.scoring_rate);
            adjusted.rush_attempts = scale(snapshot.rush_attempts, factors.rush_volume);
            adjusted.rush_yards = scale(
                snapshot.rush_yards,
                factors.rush_volume * factors.rush_efficiency,
            );
            adjusted.rush_td = scale(snapshot.rush_td, factors.scoring_rate);
        }
        Position::RB => {
            adjusted.rush_attempts = scale(snapshot.rush_attempts, factors.rush_volume);
            adjusted.rush_yards = scale(
                snapshot.rush_yards,
                factors.rush_volume * factors.rush_efficiency,
            );
            adjusted.rush_td = scale(snapshot.rush_td, factors.scoring_rate);
            adjusted.targets = scale(snapshot.targets, factors.pass_volume);
            adjusted.receptions = scale(snapshot.receptions, factors.pass_volume);
            adjusted.rec_yards = scale(snapshot.rec_yards, factors.pass_volume);
            adjusted.rec_td = scale(snapshot.rec_td, factors.scoring_rate);
        }
        Position::WR | Position::TE => {
            adjusted.targets = scale(snapshot.targets, factors.pass_volume);
            adjusted.receptions = scale(snapshot.receptions, factors.pass_volume);
            adjusted.rec_yards = scale(
                snapshot.rec_yards,
                factors.pass_volume * factors.pass_efficiency,
            );
            adjusted.rec_td = scale(snapshot.rec_td, factors.scoring_rate);
            adjusted.rush_attempts = scale(snapshot.rush_attempts, factors.rush_volume);
            adjusted.rush_yards = scale(
                snapshot.rush_yards,
                factors.rush_volume * factors.rush_efficiency,
            );
            adjusted.rush_td = scale(snapshot.rush_td, factors.scoring_rate);
        }
    }
    adjusted
}

impl ProjectionEngine {
    /// Factor bundle implied by two stored seasons of one team.
    pub async fn team_adjustment_factors(
        &mut self,
        team: &str,
        from_season: u16,
        to_season: u16,
    ) -> Result<TeamAdjustmentFactors> {
        let original = self
            .db
            .get_team_stat(team, from_season)?
            .ok_or_else(|| GridironError::TeamContextMissing {
                team: team.to_string(),
                season: from_season,
            })?;
        let new = self
            .db
            .get_team_stat(team, to_season)?
            .ok_or_else(|| GridironError::TeamContextMissing {
                team: team.to_string(),
                season: to_season,
            })?;
        Ok(calculate_team_adjustment_factors(&original, &new))
    }

    /// Direct mode: adjust the given projections from an original to a new
    /// team stat line. Pure over the snapshot list; nothing persists.
    /// Applying the same (original, new) pair to the same snapshots twice
    /// produces the same output.
    pub fn apply_team_stat_change(
        &self,
        original: &TeamStat,
        new: &TeamStat,
        projections: &[(Projection, Position)],
    ) -> Result<Vec<Projection>> {
        let factors = calculate_team_adjustment_factors(original, new);
        let mut adjusted = Vec::with_capacity(projections.len());
        for (snapshot, position) in projections {
            let mut projection = apply_factors(snapshot, *position, &factors);
            rates::derive_rates(&mut projection)?;
            rates::compute_shares(&mut projection, new);
            projection.half_ppr = scoring::half_ppr(&projection);
            adjusted.push(projection);
        }
        Ok(adjusted)
    }

    /// Scope mode: apply a factor bundle to every projection of a team's
    /// players within (season, scenario), persist in one transaction, and
    /// return the updated set.
    pub async fn apply_team_adjustments(
        &mut self,
        team: &str,
        season: u16,
        scenario_id: Option<&ScenarioId>,
        factors: &TeamAdjustmentFactors,
    ) -> Result<Vec<Projection>> {
        let team_stat = self
            .db
            .get_team_stat(team, season)?
            .ok_or_else(|| GridironError::TeamContextMissing {
                team: team.to_string(),
                season,
            })?;

        let rows = self.db.projections_for_team(team, season, scenario_id)?;
        let mut updated = Vec::with_capacity(rows.len());
        for (snapshot, player) in rows {
            if snapshot.is_fill_player {
                continue;
            }
            let mut projection = apply_factors(&snapshot, player.position, factors);
            rates::derive_rates(&mut projection)?;
            rates::compute_shares(&mut projection, &team_stat);
            projection.half_ppr = scoring::half_ppr(&projection);
            updated.push(projection);
        }

        self.db.save_projections(&mut updated)?;
        for projection in &updated {
            self.invalidate_scope(projection.player_id.as_str(), scenario_id);
        }

        info!(
            team,
            season,
            players = updated.len(),
            "applied team adjustment bundle"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_stat(pass_att: f64, pass_yards: f64, pass_td: f64, rush_att: f64, rush_yards: f64, rush_td: f64) -> TeamStat {
        let mut stat = TeamStat {
            team_stat_id: "t".to_string(),
            team: "KC".to_string(),
            season: 2024,
            week: None,
            plays: pass_att + rush_att,
            pass_attempts: pass_att,
            pass_yards,
            pass_td,
            rush_attempts: rush_att,
            rush_yards,
            rush_td,
            targets: pass_att,
            receptions: pass_att * 0.65,
            rec_yards: pass_yards,
            rec_td: pass_td,
            rank: Some(1),
            pass_percentage: 0.0,
            pass_td_rate: 0.0,
            rush_yards_per_carry: 0.0,
            created_at: 0,
            updated_at: 0,
        };
        stat.recompute_derived();
        stat
    }

    #[test]
    fn test_factor_bundle_arithmetic() {
        let original = team_stat(600.0, 4250.0, 30.0, 400.0, 1600.0, 19.0);
        let new = team_stat(700.0, 4800.0, 35.0, 300.0, 1300.0, 15.0);
        let factors = calculate_team_adjustment_factors(&original, &new);

        assert!((factors.pass_volume - 700.0 / 600.0).abs() < 0.001);
        assert!((factors.rush_volume - 0.75).abs() < 0.001);

        let orig_ypa = 4250.0 / 600.0;
        let new_ypa = 4800.0 / 700.0;
        assert!((factors.pass_efficiency - new_ypa / orig_ypa).abs() < 0.001);

        let orig_ypc = 4.0;
        let new_ypc = 1300.0 / 300.0;
        assert!((factors.rush_efficiency - new_ypc / orig_ypc).abs() < 0.001);

        assert!((factors.scoring_rate - 50.0 / 49.0).abs() < 0.001);
    }

    #[test]
    fn test_identity_bundle_is_noop() {
        let mut snapshot = Projection::blank(
            crate::types::ProjectionId::new("p"),
            crate::types::PlayerId::new("qb"),
            None,
            2024,
            17,
        );
        snapshot.pass_attempts = Some(600.0);
        snapshot.pass_yards = Some(4800.0);
        snapshot.rush_attempts = Some(60.0);

        let adjusted = apply_factors(&snapshot, Position::QB, &TeamAdjustmentFactors::identity());
        assert_eq!(adjusted.pass_attempts, Some(600.0));
        assert_eq!(adjusted.pass_yards, Some(4800.0));
        assert_eq!(adjusted.rush_attempts, Some(60.0));
    }

    #[test]
    fn test_apply_factors_is_pure_over_snapshot() {
        let mut snapshot = Projection::blank(
            crate::types::ProjectionId::new("p"),
            crate::types::PlayerId::new("te"),
            None,
            2024,
            17,
        );
        snapshot.targets = Some(140.0);
        snapshot.receptions = Some(98.0);

        let factors = TeamAdjustmentFactors {
            pass_volume: 7.0 / 6.0,
            ..TeamAdjustmentFactors::identity()
        };
        let once = apply_factors(&snapshot, Position::TE, &factors);
        let twice = apply_factors(&snapshot, Position::TE, &factors);
        // Idempotent given the same snapshot.
        assert_eq!(once.targets, twice.targets);
        assert!((once.targets.unwrap() - 140.0 * 7.0 / 6.0).abs() < 0.001);
    }
}
