//! Manual stat overrides with cascade semantics.
//!
//! Overriding a volume stat scales its counting siblings and leaves every
//! rate untouched; overriding a counting stat recomputes the matching rate;
//! overriding a rate recomputes the matching counting stat. The original
//! computed value is snapshotted so deleting the override restores the
//! projection exactly.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::{fields, rates, StatKind};
use crate::storage::models::{Projection, StatOverride};
use crate::types::{OverrideId, PlayerId, ProjectionId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Value carried by a batch override: an absolute replacement or a
/// transformation of each player's current value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "method", content = "amount", rename_all = "lowercase")]
pub enum OverrideValue {
    Absolute(f64),
    Percentage(f64),
    Increment(f64),
}

impl OverrideValue {
    fn resolve(&self, current: f64) -> f64 {
        match self {
            OverrideValue::Absolute(value) => *value,
            OverrideValue::Percentage(amount) => current * (1.0 + amount / 100.0),
            OverrideValue::Increment(amount) => current + amount,
        }
    }
}

/// Batch override request: one stat, one value rule, many players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOverrideRequest {
    pub player_ids: Vec<PlayerId>,
    pub stat_name: String,
    pub value: OverrideValue,
    pub season: u16,
    pub notes: Option<String>,
}

/// Per-player outcome of a batch override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOverrideResult {
    pub player_id: PlayerId,
    pub success: bool,
    pub old_value: Option<f64>,
    pub new_value: Option<f64>,
    pub override_id: Option<OverrideId>,
    pub error: Option<String>,
}

/// Mutate `projection` so `stat_name` moves from `old` to `new`, cascading
/// per the stat's kind. Rates re-derive afterward.
fn apply_stat_change(
    projection: &mut Projection,
    stat_name: &str,
    kind: StatKind,
    old: f64,
    new: f64,
) -> Result<()> {
    match kind {
        StatKind::Volume => {
            projection.set_stat(stat_name, Some(new));
            if old > 0.0 {
                let factor = new / old;
                if let Some(siblings) = fields::volume_siblings(stat_name) {
                    for sibling in siblings {
                        if let Some(value) = projection.stat(sibling) {
                            projection.set_stat(sibling, Some(value * factor));
                        }
                    }
                }
            }
        }
        StatKind::Counting => {
            // Volume stays put; the matching rate falls out of derivation.
            projection.set_stat(stat_name, Some(new));
        }
        StatKind::Rate => {
            projection.set_stat(stat_name, Some(new));
            if let Some((counting, volume)) = fields::counting_for_rate(stat_name) {
                if let Some(volume_value) = projection.stat(volume) {
                    projection.set_stat(counting, Some(new * volume_value));
                }
            }
        }
        StatKind::Share => {
            projection.set_stat(stat_name, Some(new.clamp(0.0, 1.0)));
        }
        StatKind::Derived => {
            return Err(GridironError::InvalidInput {
                message: format!("'{}' is derived and cannot be overridden", stat_name),
            });
        }
    }

    rates::derive_rates(projection)?;
    projection.half_ppr = scoring::half_ppr(projection);
    Ok(())
}

impl ProjectionEngine {
    /// Create (or replace) the override for (projection, stat) and cascade
    /// the change through dependent stats.
    pub async fn create_override(
        &mut self,
        projection_id: &ProjectionId,
        stat_name: &str,
        manual_value: f64,
        notes: Option<String>,
    ) -> Result<StatOverride> {
        let mut projection = self
            .db
            .get_projection(projection_id)?
            .ok_or_else(|| GridironError::ProjectionNotFound {
                projection_id: projection_id.to_string(),
            })?;
        if projection.is_fill_player {
            return Err(GridironError::InvalidInput {
                message: "fill-player projections cannot be overridden".to_string(),
            });
        }
        let player = self
            .db
            .get_player(&projection.player_id)?
            .ok_or_else(|| GridironError::PlayerNotFound {
                player_id: projection.player_id.to_string(),
            })?;
        if !fields::is_permitted(player.position, stat_name) {
            return Err(GridironError::StatNameInvalid {
                stat_name: stat_name.to_string(),
                position: player.position.to_string(),
            });
        }
        let kind = fields::stat_kind(stat_name).ok_or_else(|| GridironError::StatNameInvalid {
            stat_name: stat_name.to_string(),
            position: player.position.to_string(),
        })?;

        let current = projection.stat(stat_name).unwrap_or(0.0);

        // Replacing an existing override keeps its id and its original
        // calculated snapshot; only the manual value moves.
        let existing = self.db.find_override(projection_id, stat_name)?;
        let (override_id, calculated_value) = match &existing {
            Some(row) => (row.override_id.clone(), row.calculated_value),
            None => (OverrideId::new(""), current),
        };

        apply_stat_change(&mut projection, stat_name, kind, current, manual_value)?;
        projection.has_overrides = true;

        let mut override_row = StatOverride {
            override_id,
            player_id: projection.player_id.clone(),
            projection_id: projection_id.clone(),
            stat_name: stat_name.to_string(),
            calculated_value,
            manual_value,
            notes,
            created_at: 0,
        };
        self.db.apply_override(&mut projection, &mut override_row)?;
        self.invalidate_scope(
            projection.player_id.as_str(),
            projection.scenario_id.as_ref(),
        );

        info!(
            player = %player.name,
            stat = stat_name,
            from = current,
            to = manual_value,
            "created stat override"
        );
        Ok(override_row)
    }

    /// Delete an override, restoring the snapshotted value and re-running
    /// the same cascade from it.
    pub async fn delete_override(&mut self, override_id: &OverrideId) -> Result<Projection> {
        let override_row = self
            .db
            .get_override(override_id)?
            .ok_or_else(|| GridironError::OverrideNotFound {
                override_id: override_id.to_string(),
            })?;
        let mut projection = self
            .db
            .get_projection(&override_row.projection_id)?
            .ok_or_else(|| GridironError::ProjectionNotFound {
                projection_id: override_row.projection_id.to_string(),
            })?;

        let kind = fields::stat_kind(&override_row.stat_name).ok_or_else(|| {
            GridironError::Internal {
                message: format!("stored override names unknown stat '{}'", override_row.stat_name),
            }
        })?;
        let current = projection.stat(&override_row.stat_name).unwrap_or(0.0);
        apply_stat_change(
            &mut projection,
            &override_row.stat_name,
            kind,
            current,
            override_row.calculated_value,
        )?;

        let remaining = self.db.count_overrides(&override_row.projection_id)? - 1;
        projection.has_overrides = remaining > 0;

        self.db.remove_override(override_id, &mut projection)?;
        self.invalidate_scope(
            projection.player_id.as_str(),
            projection.scenario_id.as_ref(),
        );

        info!(
            projection_id = %override_row.projection_id,
            stat = %override_row.stat_name,
            restored = override_row.calculated_value,
            "deleted stat override"
        );
        Ok(projection)
    }

    /// Apply one override rule to many players. Elements are independent
    /// transactions: failures and cancellation never roll back committed
    /// elements, and every element reports its own outcome.
    pub async fn batch_override(
        &mut self,
        request: &BatchOverrideRequest,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<BatchOverrideResult>> {
        let mut results = Vec::with_capacity(request.player_ids.len());

        for player_id in &request.player_ids {
            if cancel
                .map(|flag| flag.load(Ordering::Relaxed))
                .unwrap_or(false)
            {
                warn!(
                    completed = results.len(),
                    total = request.player_ids.len(),
                    "batch override cancelled"
                );
                results.push(BatchOverrideResult {
                    player_id: player_id.clone(),
                    success: false,
                    old_value: None,
                    new_value: None,
                    override_id: None,
                    error: Some("cancelled".to_string()),
                });
                continue;
            }

            let outcome = self.override_one(player_id, request).await;
            results.push(match outcome {
                Ok(result) => result,
                Err(e) => BatchOverrideResult {
                    player_id: player_id.clone(),
                    success: false,
                    old_value: None,
                    new_value: None,
                    override_id: None,
                    error: Some(e.to_string()),
                },
            });
        }

        Ok(results)
    }

    async fn override_one(
        &mut self,
        player_id: &PlayerId,
        request: &BatchOverrideRequest,
    ) -> Result<BatchOverrideResult> {
        let player = self
            .db
            .get_player(player_id)?
            .ok_or_else(|| GridironError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;
        if !fields::is_permitted(player.position, &request.stat_name) {
            return Err(GridironError::PositionMismatch {
                player_id: player_id.to_string(),
                expected: positions_for_stat(&request.stat_name),
            });
        }
        let projection = self
            .db
            .find_projection(player_id, request.season, None)?
            .ok_or_else(|| GridironError::ProjectionNotFound {
                projection_id: format!("baseline for {} in {}", player_id, request.season),
            })?;

        let old_value = projection.stat(&request.stat_name).unwrap_or(0.0);
        let new_value = request.value.resolve(old_value);
        let override_row = self
            .create_override(
                &projection.projection_id,
                &request.stat_name,
                new_value,
                request.notes.clone(),
            )
            .await?;

        Ok(BatchOverrideResult {
            player_id: player_id.clone(),
            success: true,
            old_value: Some(old_value),
            new_value: Some(new_value),
            override_id: Some(override_row.override_id),
            error: None,
        })
    }
}

/// Positions whose stat set permits `stat_name`, for error messages.
fn positions_for_stat(stat_name: &str) -> String {
    let matches: Vec<String> = crate::types::Position::ALL
        .iter()
        .filter(|p| fields::is_permitted(**p, stat_name))
        .map(|p| p.to_string())
        .collect();
    if matches.is_empty() {
        "none".to_string()
    } else {
        matches.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectionId;

    fn qb_projection() -> Projection {
        let mut p = Projection::blank(
            ProjectionId::new("p1"),
            PlayerId::new("qb"),
            None,
            2024,
            17,
        );
        p.pass_attempts = Some(600.0);
        p.completions = Some(400.0);
        p.pass_yards = Some(4800.0);
        p.pass_td = Some(38.0);
        p.interceptions = Some(10.0);
        rates::derive_rates(&mut p).unwrap();
        p.half_ppr = scoring::half_ppr(&p);
        p
    }

    #[test]
    fn test_volume_cascade_preserves_rates() {
        let mut p = qb_projection();
        let before_comp_pct = p.comp_pct.unwrap();
        let before_ypa = p.yards_per_att.unwrap();

        apply_stat_change(&mut p, "pass_attempts", StatKind::Volume, 600.0, 650.0).unwrap();

        assert!((p.pass_attempts.unwrap() - 650.0).abs() < 1e-9);
        assert!((p.completions.unwrap() - 400.0 * 650.0 / 600.0).abs() < 1e-6);
        assert!((p.pass_yards.unwrap() - 5200.0).abs() < 1e-6);
        assert!((p.comp_pct.unwrap() - before_comp_pct).abs() < 1e-9);
        assert!((p.yards_per_att.unwrap() - before_ypa).abs() < 1e-9);
    }

    #[test]
    fn test_counting_cascade_recomputes_rate() {
        let mut p = qb_projection();
        apply_stat_change(&mut p, "completions", StatKind::Counting, 400.0, 420.0).unwrap();
        assert!((p.pass_attempts.unwrap() - 600.0).abs() < 1e-9);
        assert!((p.comp_pct.unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_rate_cascade_recomputes_counting() {
        let mut p = qb_projection();
        apply_stat_change(&mut p, "comp_pct", StatKind::Rate, 400.0 / 600.0, 0.7).unwrap();
        assert!((p.completions.unwrap() - 420.0).abs() < 1e-6);
        assert!((p.comp_pct.unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_cascade_updates_fantasy_points() {
        let mut p = qb_projection();
        let before = p.half_ppr;
        apply_stat_change(&mut p, "pass_td", StatKind::Counting, 38.0, 45.0).unwrap();
        assert!(p.half_ppr > before);
        assert!((p.half_ppr - before - 7.0 * 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_derived_stat_rejected() {
        let mut p = qb_projection();
        let err =
            apply_stat_change(&mut p, "net_pass_yards", StatKind::Derived, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, GridironError::InvalidInput { .. }));
    }

    #[test]
    fn test_override_value_resolution() {
        assert_eq!(OverrideValue::Absolute(45.0).resolve(38.0), 45.0);
        assert!((OverrideValue::Percentage(10.0).resolve(100.0) - 110.0).abs() < 1e-9);
        assert!((OverrideValue::Increment(-5.0).resolve(100.0) - 95.0).abs() < 1e-9);
    }
}
