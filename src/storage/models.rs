//! Data models for the storage layer

use crate::types::{OverrideId, PlayerId, Position, PlayerStatus, ProjectionId, ScenarioId};
use serde::{Deserialize, Serialize};

/// Player information stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub status: PlayerStatus,
    pub is_rookie: bool,
    pub depth_chart_position: String,
    pub draft_position: Option<u16>,
    pub draft_team: Option<String>,
    pub draft_round: Option<u16>,
    pub draft_pick: Option<u16>,
    pub is_fill_player: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Player {
    /// New active player with no draft metadata.
    pub fn new(player_id: PlayerId, name: &str, team: &str, position: Position) -> Self {
        Self {
            player_id,
            name: name.to_string(),
            team: team.to_string(),
            position,
            status: PlayerStatus::Active,
            is_rookie: false,
            depth_chart_position: "Backup".to_string(),
            draft_position: None,
            draft_team: None,
            draft_round: None,
            draft_pick: None,
            is_fill_player: false,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Season (optionally week) aggregate stats for one team.
///
/// `pass_percentage`, `pass_td_rate` and `rush_yards_per_carry` are derived
/// from the counting columns; callers mutate the counting columns and call
/// [`TeamStat::recompute_derived`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStat {
    pub team_stat_id: String,
    pub team: String,
    pub season: u16,
    pub week: Option<u16>,
    pub plays: f64,
    pub pass_attempts: f64,
    pub pass_yards: f64,
    pub pass_td: f64,
    pub rush_attempts: f64,
    pub rush_yards: f64,
    pub rush_td: f64,
    pub targets: f64,
    pub receptions: f64,
    pub rec_yards: f64,
    pub rec_td: f64,
    pub rank: Option<u16>,
    pub pass_percentage: f64,
    pub pass_td_rate: f64,
    pub rush_yards_per_carry: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TeamStat {
    /// Recompute the derived rate columns from the counting columns.
    pub fn recompute_derived(&mut self) {
        self.pass_percentage = if self.plays > 0.0 {
            self.pass_attempts / self.plays
        } else {
            0.0
        };
        self.pass_td_rate = if self.pass_attempts > 0.0 {
            self.pass_td / self.pass_attempts
        } else {
            0.0
        };
        self.rush_yards_per_carry = if self.rush_attempts > 0.0 {
            self.rush_yards / self.rush_attempts
        } else {
            0.0
        };
    }

    /// Check the internal consistency rules for team aggregates and return
    /// a description of each violation.
    ///
    /// Passing volume and receiving volume describe the same plays from two
    /// sides of the ball, so targets must match attempts and receiving
    /// production must match passing production.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if (self.pass_attempts + self.rush_attempts - self.plays).abs() > 1.0 {
            problems.push(format!(
                "pass_attempts ({}) + rush_attempts ({}) != plays ({})",
                self.pass_attempts, self.rush_attempts, self.plays
            ));
        }
        if (self.targets - self.pass_attempts).abs() > 1.0 {
            problems.push(format!(
                "targets ({}) != pass_attempts ({})",
                self.targets, self.pass_attempts
            ));
        }
        if (self.rec_yards - self.pass_yards).abs() > 1.0 {
            problems.push(format!(
                "rec_yards ({}) != pass_yards ({})",
                self.rec_yards, self.pass_yards
            ));
        }
        if (self.rec_td - self.pass_td).abs() > 0.5 {
            problems.push(format!(
                "rec_td ({}) != pass_td ({})",
                self.rec_td, self.pass_td
            ));
        }
        problems
    }
}

/// One historical stat observation for a player.
///
/// Season rows (`week == None`) are sums of the week rows plus the synthetic
/// `games` and `half_ppr` rows written at ingest time. Week rows feed the
/// empirical variance model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStat {
    pub stat_id: String,
    pub player_id: PlayerId,
    pub season: u16,
    pub week: Option<u16>,
    pub stat_type: String,
    pub value: f64,
}

/// Forward-looking stat vector for (player, season, scenario).
///
/// Every stat field is optional: position-irrelevant fields stay `None`,
/// the scorer treats absent as zero, and rate derivation skips identities
/// whose inputs are absent. `scenario_id == None` is the global baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub projection_id: ProjectionId,
    pub player_id: PlayerId,
    pub scenario_id: Option<ScenarioId>,
    pub season: u16,
    pub games: u16,
    pub half_ppr: f64,

    // Passing
    pub pass_attempts: Option<f64>,
    pub completions: Option<f64>,
    pub pass_yards: Option<f64>,
    pub pass_td: Option<f64>,
    pub interceptions: Option<f64>,
    pub sacks: Option<f64>,
    pub sack_yards: Option<f64>,
    pub net_pass_yards: Option<f64>,
    pub comp_pct: Option<f64>,
    pub yards_per_att: Option<f64>,
    pub net_yards_per_att: Option<f64>,
    pub pass_td_rate: Option<f64>,
    pub int_rate: Option<f64>,
    pub sack_rate: Option<f64>,

    // Rushing
    pub rush_attempts: Option<f64>,
    pub rush_yards: Option<f64>,
    pub rush_td: Option<f64>,
    pub fumbles: Option<f64>,
    pub net_rush_yards: Option<f64>,
    pub yards_per_carry: Option<f64>,
    pub rush_td_rate: Option<f64>,
    pub fumble_rate: Option<f64>,

    // Receiving
    pub targets: Option<f64>,
    pub receptions: Option<f64>,
    pub rec_yards: Option<f64>,
    pub rec_td: Option<f64>,
    pub catch_pct: Option<f64>,
    pub yards_per_target: Option<f64>,
    pub rec_td_rate: Option<f64>,

    // Usage and team shares
    pub snap_share: Option<f64>,
    pub target_share: Option<f64>,
    pub rush_share: Option<f64>,
    pub redzone_share: Option<f64>,
    pub pass_att_pct: Option<f64>,
    pub tar_pct: Option<f64>,
    pub car_pct: Option<f64>,

    pub has_overrides: bool,
    pub is_fill_player: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Projection {
    /// Empty projection with every stat absent.
    pub fn blank(
        projection_id: ProjectionId,
        player_id: PlayerId,
        scenario_id: Option<ScenarioId>,
        season: u16,
        games: u16,
    ) -> Self {
        Self {
            projection_id,
            player_id,
            scenario_id,
            season,
            games,
            half_ppr: 0.0,
            pass_attempts: None,
            completions: None,
            pass_yards: None,
            pass_td: None,
            interceptions: None,
            sacks: None,
            sack_yards: None,
            net_pass_yards: None,
            comp_pct: None,
            yards_per_att: None,
            net_yards_per_att: None,
            pass_td_rate: None,
            int_rate: None,
            sack_rate: None,
            rush_attempts: None,
            rush_yards: None,
            rush_td: None,
            fumbles: None,
            net_rush_yards: None,
            yards_per_carry: None,
            rush_td_rate: None,
            fumble_rate: None,
            targets: None,
            receptions: None,
            rec_yards: None,
            rec_td: None,
            catch_pct: None,
            yards_per_target: None,
            rec_td_rate: None,
            snap_share: None,
            target_share: None,
            rush_share: None,
            redzone_share: None,
            pass_att_pct: None,
            tar_pct: None,
            car_pct: None,
            has_overrides: false,
            is_fill_player: false,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Named grouping of projections for what-if analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: ScenarioId,
    pub name: String,
    pub description: Option<String>,
    pub is_baseline: bool,
    pub base_scenario_id: Option<ScenarioId>,
    pub season: u16,
    pub parameters: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Manual replacement of one stat on one projection.
///
/// `calculated_value` snapshots the pre-override value so deletion can
/// restore it; exactly one row exists per (projection, stat_name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatOverride {
    pub override_id: OverrideId,
    pub player_id: PlayerId,
    pub projection_id: ProjectionId,
    pub stat_name: String,
    pub calculated_value: f64,
    pub manual_value: f64,
    pub notes: Option<String>,
    pub created_at: i64,
}
