//! Template-driven projections for players with no NFL history.
//!
//! Templates bucket each position by draft capital; per-game rates multiply
//! out to season counting stats, and everything downstream (rates, shares,
//! fantasy points) derives the same way veteran projections do.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::rates;
use crate::storage::models::Projection;
use crate::types::{PlayerId, PlayerStatus, Position, ProjectionId, ScenarioId};
use serde::Serialize;
use tracing::{debug, info};

/// Per-game rates and usage for one position/draft-capital bucket.
#[derive(Debug, Clone, Serialize)]
pub struct RookieProjectionTemplate {
    pub position: Position,
    pub draft_round: u16,
    pub draft_pick_min: u16,
    pub draft_pick_max: u16,
    pub games: f64,
    pub snap_share: f64,
    // QB rates (pass_attempts is a season total)
    pub pass_attempts: Option<f64>,
    pub comp_pct: Option<f64>,
    pub yards_per_att: Option<f64>,
    pub pass_td_rate: Option<f64>,
    pub int_rate: Option<f64>,
    pub rush_att_per_game: Option<f64>,
    pub rush_yards_per_att: Option<f64>,
    pub rush_td_per_game: Option<f64>,
    pub rush_td_per_att: Option<f64>,
    // Receiving rates (RB/WR/TE)
    pub targets_per_game: Option<f64>,
    pub catch_rate: Option<f64>,
    pub rec_yards_per_catch: Option<f64>,
    pub rec_td_per_catch: Option<f64>,
}

#[allow(clippy::too_many_arguments)]
const fn qb(round: u16, pick_min: u16, pick_max: u16, games: f64, snap_share: f64,
    pass_attempts: f64, comp_pct: f64, yards_per_att: f64, pass_td_rate: f64, int_rate: f64,
    rush_att_per_game: f64, rush_yards_per_att: f64, rush_td_per_game: f64) -> RookieProjectionTemplate {
    RookieProjectionTemplate {
        position: Position::QB,
        draft_round: round,
        draft_pick_min: pick_min,
        draft_pick_max: pick_max,
        games,
        snap_share,
        pass_attempts: Some(pass_attempts),
        comp_pct: Some(comp_pct),
        yards_per_att: Some(yards_per_att),
        pass_td_rate: Some(pass_td_rate),
        int_rate: Some(int_rate),
        rush_att_per_game: Some(rush_att_per_game),
        rush_yards_per_att: Some(rush_yards_per_att),
        rush_td_per_game: Some(rush_td_per_game),
        rush_td_per_att: None,
        targets_per_game: None,
        catch_rate: None,
        rec_yards_per_catch: None,
        rec_td_per_catch: None,
    }
}

#[allow(clippy::too_many_arguments)]
const fn runner(position: Position, round: u16, pick_min: u16, pick_max: u16, games: f64, snap_share: f64,
    rush_att_per_game: f64, rush_yards_per_att: f64, rush_td_per_att: f64,
    targets_per_game: f64, catch_rate: f64, rec_yards_per_catch: f64, rec_td_per_catch: f64) -> RookieProjectionTemplate {
    RookieProjectionTemplate {
        position,
        draft_round: round,
        draft_pick_min: pick_min,
        draft_pick_max: pick_max,
        games,
        snap_share,
        pass_attempts: None,
        comp_pct: None,
        yards_per_att: None,
        pass_td_rate: None,
        int_rate: None,
        rush_att_per_game: Some(rush_att_per_game),
        rush_yards_per_att: Some(rush_yards_per_att),
        rush_td_per_game: None,
        rush_td_per_att: Some(rush_td_per_att),
        targets_per_game: Some(targets_per_game),
        catch_rate: Some(catch_rate),
        rec_yards_per_catch: Some(rec_yards_per_catch),
        rec_td_per_catch: Some(rec_td_per_catch),
    }
}

/// The template table, bucketed by position and draft capital.
static TEMPLATES: &[RookieProjectionTemplate] = &[
    // QB tiers
    qb(1, 1, 10, 16.0, 0.80, 520.0, 0.62, 7.2, 0.040, 0.030, 4.0, 5.0, 0.20),
    qb(1, 11, 32, 12.0, 0.60, 380.0, 0.60, 6.8, 0.030, 0.035, 3.5, 4.5, 0.15),
    qb(2, 33, 105, 6.0, 0.30, 180.0, 0.58, 6.5, 0.025, 0.040, 2.5, 4.0, 0.10),
    qb(4, 106, 262, 2.0, 0.10, 60.0, 0.55, 6.0, 0.020, 0.045, 1.5, 3.5, 0.05),
    // RB tiers
    runner(Position::RB, 1, 1, 32, 15.0, 0.65, 14.0, 4.4, 0.030, 3.5, 0.75, 8.0, 0.04),
    runner(Position::RB, 2, 33, 64, 14.0, 0.55, 11.0, 4.2, 0.025, 3.0, 0.70, 7.5, 0.03),
    runner(Position::RB, 3, 65, 140, 13.0, 0.40, 7.0, 4.0, 0.020, 2.0, 0.65, 7.0, 0.02),
    runner(Position::RB, 5, 141, 262, 10.0, 0.25, 4.0, 3.8, 0.015, 1.0, 0.60, 6.5, 0.01),
    // WR tiers
    runner(Position::WR, 1, 1, 15, 16.0, 0.80, 0.5, 8.0, 0.030, 7.0, 0.65, 13.5, 0.07),
    runner(Position::WR, 1, 16, 32, 15.0, 0.70, 0.4, 7.5, 0.025, 6.0, 0.63, 13.0, 0.06),
    runner(Position::WR, 2, 33, 64, 14.0, 0.60, 0.3, 7.0, 0.020, 5.0, 0.62, 12.5, 0.05),
    runner(Position::WR, 3, 65, 140, 13.0, 0.40, 0.2, 6.0, 0.010, 3.5, 0.60, 12.0, 0.04),
    runner(Position::WR, 5, 141, 262, 10.0, 0.25, 0.1, 5.0, 0.005, 2.0, 0.58, 11.0, 0.03),
    // TE tiers
    runner(Position::TE, 1, 1, 32, 15.0, 0.70, 0.0, 0.0, 0.0, 5.0, 0.68, 11.0, 0.08),
    runner(Position::TE, 2, 33, 105, 14.0, 0.60, 0.0, 0.0, 0.0, 3.5, 0.65, 10.5, 0.06),
    runner(Position::TE, 4, 106, 262, 12.0, 0.40, 0.0, 0.0, 0.0, 2.0, 0.60, 9.5, 0.04),
];

/// Games multiplier for undrafted players projected off the last tier.
const UDFA_GAMES_FACTOR: f64 = 0.5;

/// Templates for one position, in draft-capital order.
pub fn templates_for_position(position: Position) -> Vec<&'static RookieProjectionTemplate> {
    TEMPLATES.iter().filter(|t| t.position == position).collect()
}

/// The template whose pick range contains `draft_pick`.
pub fn find_template(
    position: Position,
    draft_pick: u16,
) -> Option<&'static RookieProjectionTemplate> {
    TEMPLATES.iter().find(|t| {
        t.position == position && draft_pick >= t.draft_pick_min && draft_pick <= t.draft_pick_max
    })
}

impl ProjectionEngine {
    /// Build a projection for a rookie from their position/draft-slot
    /// template. Undrafted players use the lowest tier with games halved.
    pub async fn build_rookie_projection(
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
        if player.status != PlayerStatus::Rookie && !player.is_rookie {
            return Err(GridironError::InvalidInput {
                message: format!("player {} is not a rookie", player.name),
            });
        }

        let draft_pick = player.draft_position.or(player.draft_pick);
        let (template, games_factor) = match draft_pick {
            Some(pick) => match find_template(player.position, pick) {
                Some(template) => (template, 1.0),
                None => {
                    // Pick outside every bucket: treat like a UDFA.
                    (last_tier(player.position, pick)?, UDFA_GAMES_FACTOR)
                }
            },
            // Undrafted: lowest tier, halved playing time.
            None => (last_tier(player.position, 0)?, UDFA_GAMES_FACTOR),
        };

        let games = template.games * games_factor;
        let mut projection = match self.db.find_projection(player_id, season, scenario_id)? {
            Some(existing) => {
                let shell = Projection::blank(
                    existing.projection_id.clone(),
                    player_id.clone(),
                    scenario_id.cloned(),
                    season,
                    games.round() as u16,
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
                games.round() as u16,
            ),
        };
        projection.snap_share = Some(template.snap_share);

        // Passing: template attempts are already a season total; the
        // UDFA factor shrinks them with playing time.
        if let Some(attempts) = template.pass_attempts {
            let attempts = attempts * games_factor;
            projection.pass_attempts = Some(attempts);
            if let Some(comp_pct) = template.comp_pct {
                projection.completions = Some(attempts * comp_pct);
            }
            if let Some(ypa) = template.yards_per_att {
                projection.pass_yards = Some(attempts * ypa);
            }
            if let Some(td_rate) = template.pass_td_rate {
                projection.pass_td = Some(attempts * td_rate);
            }
            if let Some(int_rate) = template.int_rate {
                projection.interceptions = Some(attempts * int_rate);
            }
        }

        // Rushing: per-game attempts scale by games.
        if let Some(att_per_game) = template.rush_att_per_game {
            let attempts = att_per_game * games;
            if attempts > 0.0 {
                projection.rush_attempts = Some(attempts);
                if let Some(ypc) = template.rush_yards_per_att {
                    projection.rush_yards = Some(attempts * ypc);
                }
                if let Some(td_per_game) = template.rush_td_per_game {
                    projection.rush_td = Some(td_per_game * games);
                } else if let Some(td_per_att) = template.rush_td_per_att {
                    projection.rush_td = Some(attempts * td_per_att);
                }
            }
        }

        // Receiving: targets per game, then the catch chain.
        if let Some(targets_per_game) = template.targets_per_game {
            let targets = targets_per_game * games;
            if targets > 0.0 {
                projection.targets = Some(targets);
                if let Some(catch_rate) = template.catch_rate {
                    let receptions = targets * catch_rate;
                    projection.receptions = Some(receptions);
                    if let Some(yards_per_catch) = template.rec_yards_per_catch {
                        projection.rec_yards = Some(receptions * yards_per_catch);
                    }
                    if let Some(td_per_catch) = template.rec_td_per_catch {
                        projection.rec_td = Some(receptions * td_per_catch);
                    }
                }
            }
        }

        rates::derive_rates(&mut projection)?;
        if let Some(team) = self.db.get_team_stat(&player.team, season)? {
            rates::compute_shares(&mut projection, &team);
        }
        projection.half_ppr = scoring::half_ppr(&projection);

        if projection.projection_id.as_str().is_empty() {
            self.db.insert_projection(&mut projection)?;
        } else {
            // Same contract as the baseline rebuild: stale override rows
            // are dropped alongside the replaced stats.
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
            tier = template.draft_round,
            half_ppr = format!("{:.1}", projection.half_ppr),
            "built rookie projection"
        );
        Ok(projection)
    }
}

/// Lowest draft-capital tier for a position.
fn last_tier(position: Position, draft_pick: u16) -> Result<&'static RookieProjectionTemplate> {
    templates_for_position(position)
        .into_iter()
        .max_by_key(|t| t.draft_pick_max)
        .ok_or(GridironError::RookieRequiresTemplate {
            position: position.to_string(),
            draft_pick,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_lookup_by_pick() {
        let template = find_template(Position::QB, 1).unwrap();
        assert_eq!(template.pass_attempts, Some(520.0));
        assert_eq!(template.games, 16.0);

        let template = find_template(Position::QB, 50).unwrap();
        assert_eq!(template.pass_attempts, Some(180.0));

        let template = find_template(Position::WR, 20).unwrap();
        assert_eq!(template.targets_per_game, Some(6.0));

        assert!(find_template(Position::QB, 300).is_none());
    }

    #[test]
    fn test_templates_cover_every_position() {
        for position in Position::ALL {
            let templates = templates_for_position(position);
            assert!(!templates.is_empty());
            // Every pick from 1 to 262 lands in exactly one bucket.
            for pick in 1..=262u16 {
                let matches = templates
                    .iter()
                    .filter(|t| pick >= t.draft_pick_min && pick <= t.draft_pick_max)
                    .count();
                assert_eq!(matches, 1, "{} pick {} matched {} buckets", position, pick, matches);
            }
        }
    }

    #[test]
    fn test_last_tier_is_lowest_capital() {
        let tier = last_tier(Position::RB, 0).unwrap();
        assert_eq!(tier.draft_pick_max, 262);
        assert_eq!(tier.rush_att_per_game, Some(4.0));
    }
}
