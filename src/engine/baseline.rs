//! Baseline projections from historical stats plus team context.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::rates;
use crate::storage::models::{Player, Projection, TeamStat};
use crate::types::{PlayerId, Position, ProjectionId, ScenarioId};
use std::collections::HashMap;
use tracing::{debug, info};

/// Weight on the most recent prior season when two seasons of history exist.
const RECENT_SEASON_WEIGHT: f64 = 0.65;
const PRIOR_SEASON_WEIGHT: f64 = 0.35;

/// Counting stats carried forward from history, per position.
fn carried_stats(position: Position) -> &'static [&'static str] {
    match position {
        Position::QB => &[
            "pass_attempts",
            "completions",
            "pass_yards",
            "pass_td",
            "interceptions",
            "sacks",
            "sack_yards",
            "rush_attempts",
            "rush_yards",
            "rush_td",
            "fumbles",
            "redzone_share",
        ],
        Position::RB => &[
            "rush_attempts",
            "rush_yards",
            "rush_td",
            "fumbles",
            "targets",
            "receptions",
            "rec_yards",
            "rec_td",
            "redzone_share",
        ],
        Position::WR => &[
            "targets",
            "receptions",
            "rec_yards",
            "rec_td",
            "rush_attempts",
            "rush_yards",
            "rush_td",
            "fumbles",
            "redzone_share",
        ],
        Position::TE => &[
            "targets",
            "receptions",
            "rec_yards",
            "rec_td",
            "fumbles",
            "redzone_share",
        ],
    }
}

/// Team category whose season-over-season ratio scales a carried stat.
/// Returns `None` for stats that are not team-context scaled.
fn scaling_category(stat_name: &str) -> Option<&'static str> {
    match stat_name {
        "pass_attempts" | "completions" | "sacks" => Some("pass_attempts"),
        "pass_yards" | "sack_yards" => Some("pass_yards"),
        "pass_td" | "interceptions" => Some("pass_td"),
        "rush_attempts" => Some("rush_attempts"),
        "rush_yards" => Some("rush_yards"),
        "rush_td" => Some("rush_td"),
        "targets" | "receptions" => Some("targets"),
        "rec_yards" => Some("rec_yards"),
        "rec_td" => Some("rec_td"),
        _ => None,
    }
}

fn team_category(team: &TeamStat, category: &str) -> f64 {
    match category {
        "pass_attempts" => team.pass_attempts,
        "pass_yards" => team.pass_yards,
        "pass_td" => team.pass_td,
        "rush_attempts" => team.rush_attempts,
        "rush_yards" => team.rush_yards,
        "rush_td" => team.rush_td,
        "targets" => team.targets,
        "rec_yards" => team.rec_yards,
        "rec_td" => team.rec_td,
        _ => 0.0,
    }
}

/// Blend two seasons of history, weighting the most recent one.
fn weighted_stat(recent: Option<f64>, prior: Option<f64>) -> Option<f64> {
    match (recent, prior) {
        (Some(r), Some(p)) => Some(r * RECENT_SEASON_WEIGHT + p * PRIOR_SEASON_WEIGHT),
        (Some(r), None) => Some(r),
        (None, Some(p)) => Some(p),
        (None, None) => None,
    }
}

impl ProjectionEngine {
    /// Build the baseline projection for (player, season, scenario) from the
    /// player's prior-season stats and the team's current context.
    ///
    /// Re-running replaces the stats on the existing projection rather than
    /// inserting a duplicate; any overrides on the old row are dropped so
    /// `has_overrides` and the override table stay in sync with the rebuilt
    /// stats.
    pub async fn create_base_projection(
        &mut self,
        player_id: &PlayerId,
        season: u16,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Projection> {
        let player = self
            .db
            .get_player(player_id)?
            .ok_or_else(|| GridironError::PlayerNotFound {
                player_id: player_id.to_string(),
            })?;

        if player.is_rookie || player.status == crate::types::PlayerStatus::Rookie {
            // Rookies have no history to project from; the template path
            // owns them.
            return Err(GridironError::RookieRequiresTemplate {
                position: player.position.to_string(),
                draft_pick: player.draft_pick.unwrap_or(0),
            });
        }

        let team = self
            .db
            .get_team_stat(&player.team, season)?
            .ok_or_else(|| GridironError::TeamContextMissing {
                team: player.team.clone(),
                season,
            })?;

        let recent = self.db.get_season_stats(player_id, season - 1)?;
        let prior = self.db.get_season_stats(player_id, season - 2)?;
        let (recent, prior) = if recent.is_empty() {
            if prior.is_empty() {
                return Err(GridironError::NotEnoughHistory {
                    player_id: player_id.to_string(),
                    season,
                });
            }
            // Fall back to the season before last as the lone source year.
            (prior, HashMap::new())
        } else {
            (recent, prior)
        };

        let mut projection = match self.db.find_projection(player_id, season, scenario_id)? {
            Some(existing) => {
                let shell = Projection::blank(
                    existing.projection_id.clone(),
                    player_id.clone(),
                    scenario_id.cloned(),
                    season,
                    existing.games,
                );
                Projection {
                    created_at: existing.created_at,
                    ..shell
                }
            }
            None => Projection::blank(
                ProjectionId::new(""),
                player_id.clone(),
                scenario_id.cloned(),
                season,
                17,
            ),
        };

        // A short prior year projects forward as a short year.
        let prior_games = recent.get("games").copied().unwrap_or(17.0);
        projection.games = if prior_games <= 12.0 { 16 } else { 17 };

        let prior_team = self.db.get_team_stat(&player.team, season - 1)?;
        if prior_team.is_none() {
            debug!(
                team = %player.team,
                season = season - 1,
                "no prior-season team context; skipping volume scaling"
            );
        }

        for stat_name in carried_stats(player.position) {
            let carried = weighted_stat(
                recent.get(*stat_name).copied(),
                prior.get(*stat_name).copied(),
            );
            let Some(mut value) = carried else { continue };

            if let (Some(category), Some(prior_team)) =
                (scaling_category(stat_name), prior_team.as_ref())
            {
                let this_season = team_category(&team, category);
                let last_season = team_category(prior_team, category);
                if this_season > 0.0 && last_season > 0.0 {
                    value *= this_season / last_season;
                }
            }
            projection.set_stat(stat_name, Some(value));
        }

        rates::derive_rates(&mut projection)?;
        rates::compute_shares(&mut projection, &team);
        projection.half_ppr = scoring::half_ppr(&projection);

        if projection.projection_id.as_str().is_empty() {
            self.db.insert_projection(&mut projection)?;
        } else {
            // A rebuild starts clean: stale override rows would carry
            // pre-rebuild snapshots, so they are dropped with the stats.
            let cleared = self.db.rebuild_projection(&mut projection)?;
            if cleared > 0 {
                debug!(
                    projection_id = %projection.projection_id,
                    cleared,
                    "rebuild dropped stale overrides"
                );
            }
        }
        self.invalidate_scope(player_id.as_str(), scenario_id);

        info!(
            player = %player.name,
            season,
            half_ppr = format!("{:.1}", projection.half_ppr),
            "built baseline projection"
        );
        Ok(projection)
    }

    /// Build baselines for every active non-rookie player on a team.
    pub async fn create_team_baselines(
        &mut self,
        team: &str,
        season: u16,
        scenario_id: Option<&ScenarioId>,
    ) -> Result<Vec<Projection>> {
        let players: Vec<Player> = self
            .db
            .list_players(Some(team), None)?
            .into_iter()
            .filter(|p| !p.is_fill_player && !p.is_rookie)
            .collect();

        let mut projections = Vec::new();
        for player in players {
            match self
                .create_base_projection(&player.player_id, season, scenario_id)
                .await
            {
                Ok(projection) => projections.push(projection),
                Err(e) if e.is_precondition() => {
                    debug!(player = %player.name, error = %e, "skipping baseline");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(projections)
    }
}
