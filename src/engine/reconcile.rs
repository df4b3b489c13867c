//! Fill players: synthetic roster entries absorbing the residual between
//! summed player projections and team totals.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::rates;
use crate::storage::models::{Player, Projection};
use crate::types::{PlayerStatus, Position, ProjectionId, ScenarioId};
use std::collections::HashMap;
use tracing::{info, warn};

/// Residual below this threshold is considered reconciled.
const RESIDUAL_EPSILON: f64 = 0.5;

/// Reconciled stat categories and the fill position absorbing each group.
const CATEGORY_BUCKETS: [(Position, &[&str]); 3] = [
    (Position::QB, &["pass_attempts", "pass_yards", "pass_td"]),
    (Position::RB, &["rush_attempts", "rush_yards", "rush_td"]),
    (
        Position::WR,
        &["targets", "receptions", "rec_yards", "rec_td"],
    ),
];

impl ProjectionEngine {
    /// Ensure summed player stats reconcile to the team totals for
    /// (team, season, scenario) by synthesizing fill players per position
    /// bucket. Prior fill projections for the scope are deleted first, so
    /// the operation is safe to re-run.
    pub async fn reconcile_team(
        &mut self,
        team: &str,
        season: u16,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Vec<Projection>> {
        let team_stat = self
            .db
            .get_team_stat(team, season)?
            .ok_or_else(|| GridironError::TeamContextMissing {
                team: team.to_string(),
                season,
            })?;

        let removed = self.db.delete_fill_projections(team, season, scenario_id)?;
        if removed > 0 {
            info!(team, season, removed, "cleared prior fill projections");
        }

        let rows = self.db.projections_for_team(team, season, scenario_id)?;
        let mut sums: HashMap<&str, f64> = HashMap::new();
        for (projection, _) in &rows {
            for (_, categories) in CATEGORY_BUCKETS {
                for &category in categories {
                    *sums.entry(category).or_insert(0.0) +=
                        projection.stat(category).unwrap_or(0.0);
                }
            }
        }

        let team_total = |category: &str| -> f64 {
            match category {
                "pass_attempts" => team_stat.pass_attempts,
                "pass_yards" => team_stat.pass_yards,
                "pass_td" => team_stat.pass_td,
                "rush_attempts" => team_stat.rush_attempts,
                "rush_yards" => team_stat.rush_yards,
                "rush_td" => team_stat.rush_td,
                "targets" => team_stat.targets,
                "receptions" => team_stat.receptions,
                "rec_yards" => team_stat.rec_yards,
                "rec_td" => team_stat.rec_td,
                _ => 0.0,
            }
        };

        let mut fills = Vec::new();
        for (position, categories) in CATEGORY_BUCKETS {
            let mut residuals: Vec<(&str, f64)> = Vec::new();
            let mut bucket_needed = false;
            for &category in categories {
                let residual = team_total(category) - sums.get(category).copied().unwrap_or(0.0);
                if residual > RESIDUAL_EPSILON {
                    bucket_needed = true;
                    residuals.push((category, residual));
                } else if residual < -RESIDUAL_EPSILON {
                    // Players already exceed the team total; a fill player
                    // cannot absorb a negative share.
                    warn!(
                        team,
                        season,
                        category,
                        residual = format!("{:.1}", residual),
                        "player projections exceed team total"
                    );
                }
            }
            if !bucket_needed {
                continue;
            }

            let fill_player = self.ensure_fill_player(team, position)?;
            let mut projection = Projection::blank(
                ProjectionId::new(""),
                fill_player.player_id.clone(),
                scenario_id.cloned(),
                season,
                17,
            );
            projection.is_fill_player = true;
            for (category, residual) in residuals {
                projection.set_stat(category, Some(residual));
            }
            rates::derive_rates(&mut projection)?;
            rates::compute_shares(&mut projection, &team_stat);
            projection.half_ppr = scoring::half_ppr(&projection);
            self.db.insert_projection(&mut projection)?;
            fills.push(projection);
        }

        for fill in &fills {
            self.invalidate_scope(fill.player_id.as_str(), scenario_id);
        }

        info!(team, season, fills = fills.len(), "reconciled team totals");
        Ok(fills)
    }

    /// Reuse the team's fill player for a position, creating it on first
    /// use.
    fn ensure_fill_player(&mut self, team: &str, position: Position) -> Result<Player> {
        if let Some(existing) = self.db.find_fill_player(team, position)? {
            return Ok(existing);
        }
        let mut player = self.db.create_player(
            &format!("{} Fill {}", team, position),
            team,
            position,
        )?;
        player.is_fill_player = true;
        player.status = PlayerStatus::Active;
        player.depth_chart_position = "Reserve".to_string();
        self.db.upsert_player(&player)?;
        Ok(player)
    }
}
