//! Bounded multiplicative adjustments at player scope.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::rates;
use crate::storage::models::{Projection, TeamStat};
use crate::types::{Position, ProjectionId};
use std::collections::HashMap;
use tracing::info;

/// Valid range for an adjustment factor key, `None` for unknown keys.
///
/// For the share keys (`target_share`, `rush_share`) the range spans both
/// interpretations: values in [0, 0.5] are absolute shares of the team
/// total, values in (1.0, 1.5] are multipliers, and the gap between them is
/// rejected as ambiguous.
pub fn adjustment_range(factor: &str) -> Option<(f64, f64)> {
    match factor {
        "pass_volume" | "rush_volume" | "snap_share" => Some((0.5, 1.5)),
        "td_rate" | "int_rate" | "scoring_rate" => Some((0.5, 2.0)),
        "target_share" | "rush_share" => Some((0.0, 1.5)),
        _ => None,
    }
}

fn is_share_key(factor: &str) -> bool {
    matches!(factor, "target_share" | "rush_share")
}

fn out_of_range(factor: &str, value: f64, min: f64, max: f64) -> GridironError {
    GridironError::AdjustmentOutOfRange {
        factor: factor.to_string(),
        value,
        min,
        max,
    }
}

/// Validate a factor map without touching any projection.
fn validate_adjustments(adjustments: &HashMap<String, f64>) -> Result<()> {
    for (factor, &value) in adjustments {
        let Some((min, max)) = adjustment_range(factor) else {
            return Err(GridironError::InvalidInput {
                message: format!("unknown adjustment factor '{}'", factor),
            });
        };
        if !(min..=max).contains(&value) {
            return Err(out_of_range(factor, value, min, max));
        }
        if is_share_key(factor) && value > 0.5 && value <= 1.0 {
            // Ambiguous zone: too large for an absolute share, too small
            // for a multiplier.
            return Err(out_of_range(factor, value, min, max));
        }
    }
    Ok(())
}

/// Resolve a share-key value into a multiplier over the current stat.
///
/// Values <= 1 are absolute shares of the team total; values > 1 are
/// already multipliers.
fn share_multiplier(
    factor: &str,
    value: f64,
    current: Option<f64>,
    team: Option<&TeamStat>,
) -> Result<f64> {
    if value > 1.0 {
        return Ok(value);
    }
    let team = team.ok_or_else(|| GridironError::InvalidInput {
        message: format!(
            "absolute {} requires team context for the projection season",
            factor
        ),
    })?;
    let team_total = match factor {
        "target_share" => team.targets,
        _ => team.rush_attempts,
    };
    let target_volume = value * team_total;
    match current {
        Some(current) if current > 0.0 => Ok(target_volume / current),
        _ => Err(GridironError::InvalidInput {
            message: format!(
                "cannot apply absolute {} to a projection with no existing volume",
                factor
            ),
        }),
    }
}

/// Stats scaled by each factor. TD-rate style factors pick their stat by
/// position; everything else is fixed.
fn affected_stats(factor: &str, position: Position) -> &'static [&'static str] {
    match factor {
        "pass_volume" => &["pass_attempts", "completions", "pass_yards"],
        "rush_volume" => &["rush_attempts", "rush_yards"],
        "target_share" => &["targets", "receptions", "rec_yards", "rec_td"],
        "rush_share" => &["rush_attempts", "rush_yards", "rush_td"],
        "td_rate" => {
            if position == Position::QB {
                &["pass_td"]
            } else {
                &["rec_td"]
            }
        }
        "int_rate" => &["interceptions"],
        "scoring_rate" => &["pass_td", "rush_td", "rec_td"],
        _ => &[],
    }
}

impl ProjectionEngine {
    /// Apply a map of adjustment factors to one projection.
    ///
    /// The whole map validates before anything mutates, every factor scales
    /// from the same pre-adjustment snapshot, and rates re-derive afterward
    /// so volume factors leave efficiency untouched.
    pub async fn update_projection(
        &mut self,
        projection_id: &ProjectionId,
        adjustments: &HashMap<String, f64>,
    ) -> Result<Projection> {
        validate_adjustments(adjustments)?;

        let snapshot = self
            .db
            .get_projection(projection_id)?
            .ok_or_else(|| GridironError::ProjectionNotFound {
                projection_id: projection_id.to_string(),
            })?;
        let player = self
            .db
            .get_player(&snapshot.player_id)?
            .ok_or_else(|| GridironError::PlayerNotFound {
                player_id: snapshot.player_id.to_string(),
            })?;
        let team = self.db.get_team_stat(&player.team, snapshot.season)?;

        // Accumulate one combined multiplier per stat so factors that share
        // a stat compose instead of compounding through intermediate writes.
        let mut multipliers: HashMap<&'static str, f64> = HashMap::new();
        let mut snap_share_factor: Option<f64> = None;

        for (factor, &value) in adjustments {
            if factor == "snap_share" {
                snap_share_factor = Some(value);
                continue;
            }
            let multiplier = if is_share_key(factor) {
                let volume_stat = if factor == "target_share" {
                    "targets"
                } else {
                    "rush_attempts"
                };
                share_multiplier(factor, value, snapshot.stat(volume_stat), team.as_ref())?
            } else {
                value
            };
            for stat in affected_stats(factor, player.position) {
                *multipliers.entry(stat).or_insert(1.0) *= multiplier;
            }
        }

        let mut projection = snapshot.clone();
        for (stat, multiplier) in &multipliers {
            if let Some(value) = snapshot.stat(stat) {
                projection.set_stat(stat, Some(value * multiplier));
            }
        }
        if let Some(factor) = snap_share_factor {
            if let Some(share) = snapshot.snap_share {
                projection.snap_share = Some((share * factor).clamp(0.0, 1.0));
            }
        }

        rates::derive_rates(&mut projection)?;
        if let Some(team) = &team {
            rates::compute_shares(&mut projection, team);
        }
        projection.half_ppr = scoring::half_ppr(&projection);

        self.db.save_projection(&mut projection)?;
        self.invalidate_scope(
            projection.player_id.as_str(),
            projection.scenario_id.as_ref(),
        );

        info!(
            projection_id = %projection_id,
            factors = adjustments.len(),
            half_ppr = format!("{:.1}", projection.half_ppr),
            "applied player adjustments"
        );
        Ok(projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert_eq!(adjustment_range("pass_volume"), Some((0.5, 1.5)));
        assert_eq!(adjustment_range("scoring_rate"), Some((0.5, 2.0)));
        assert_eq!(adjustment_range("target_share"), Some((0.0, 1.5)));
        assert_eq!(adjustment_range("made_up"), None);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut adjustments = HashMap::new();
        adjustments.insert("pass_volume".to_string(), 2.0);
        assert!(matches!(
            validate_adjustments(&adjustments).unwrap_err(),
            GridironError::AdjustmentOutOfRange { .. }
        ));

        // Ambiguous share value: above the absolute band, below the
        // multiplier band.
        let mut adjustments = HashMap::new();
        adjustments.insert("target_share".to_string(), 0.7);
        assert!(matches!(
            validate_adjustments(&adjustments).unwrap_err(),
            GridironError::AdjustmentOutOfRange { .. }
        ));

        let mut adjustments = HashMap::new();
        adjustments.insert("target_share".to_string(), 0.3);
        adjustments.insert("td_rate".to_string(), 1.1);
        assert!(validate_adjustments(&adjustments).is_ok());
    }

    #[test]
    fn test_td_rate_dispatches_by_position() {
        assert_eq!(affected_stats("td_rate", Position::QB), &["pass_td"]);
        assert_eq!(affected_stats("td_rate", Position::WR), &["rec_td"]);
        assert_eq!(affected_stats("td_rate", Position::RB), &["rec_td"]);
    }
}
