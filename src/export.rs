//! Flat export records for CSV and JSON encoding.

use crate::engine::ProjectionEngine;
use crate::error::Result;
use crate::storage::models::{Player, Projection};
use crate::storage::ProjectionFilter;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One projection flattened with its player metadata, every relevant stat
/// field present. Optional fields serialize as empty CSV cells / JSON
/// nulls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub player_id: String,
    pub name: String,
    pub team: String,
    pub position: String,
    pub season: u16,
    pub scenario_id: Option<String>,
    pub games: u16,
    pub half_ppr: f64,
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
    pub rush_attempts: Option<f64>,
    pub rush_yards: Option<f64>,
    pub rush_td: Option<f64>,
    pub fumbles: Option<f64>,
    pub yards_per_carry: Option<f64>,
    pub rush_td_rate: Option<f64>,
    pub fumble_rate: Option<f64>,
    pub targets: Option<f64>,
    pub receptions: Option<f64>,
    pub rec_yards: Option<f64>,
    pub rec_td: Option<f64>,
    pub catch_pct: Option<f64>,
    pub yards_per_target: Option<f64>,
    pub rec_td_rate: Option<f64>,
    pub snap_share: Option<f64>,
    pub target_share: Option<f64>,
    pub rush_share: Option<f64>,
    pub redzone_share: Option<f64>,
    pub tar_pct: Option<f64>,
    pub car_pct: Option<f64>,
    pub pass_att_pct: Option<f64>,
    pub has_overrides: bool,
    pub is_fill_player: bool,
}

impl ExportRecord {
    fn from_row(projection: &Projection, player: &Player) -> Self {
        Self {
            player_id: player.player_id.as_str().to_string(),
            name: player.name.clone(),
            team: player.team.clone(),
            position: player.position.to_string(),
            season: projection.season,
            scenario_id: projection.scenario_id.as_ref().map(|s| s.as_str().to_string()),
            games: projection.games,
            half_ppr: projection.half_ppr,
            pass_attempts: projection.pass_attempts,
            completions: projection.completions,
            pass_yards: projection.pass_yards,
            pass_td: projection.pass_td,
            interceptions: projection.interceptions,
            sacks: projection.sacks,
            sack_yards: projection.sack_yards,
            net_pass_yards: projection.net_pass_yards,
            comp_pct: projection.comp_pct,
            yards_per_att: projection.yards_per_att,
            net_yards_per_att: projection.net_yards_per_att,
            pass_td_rate: projection.pass_td_rate,
            int_rate: projection.int_rate,
            sack_rate: projection.sack_rate,
            rush_attempts: projection.rush_attempts,
            rush_yards: projection.rush_yards,
            rush_td: projection.rush_td,
            fumbles: projection.fumbles,
            yards_per_carry: projection.yards_per_carry,
            rush_td_rate: projection.rush_td_rate,
            fumble_rate: projection.fumble_rate,
            targets: projection.targets,
            receptions: projection.receptions,
            rec_yards: projection.rec_yards,
            rec_td: projection.rec_td,
            catch_pct: projection.catch_pct,
            yards_per_target: projection.yards_per_target,
            rec_td_rate: projection.rec_td_rate,
            snap_share: projection.snap_share,
            target_share: projection.target_share,
            rush_share: projection.rush_share,
            redzone_share: projection.redzone_share,
            tar_pct: projection.tar_pct,
            car_pct: projection.car_pct,
            pass_att_pct: projection.pass_att_pct,
            has_overrides: projection.has_overrides,
            is_fill_player: projection.is_fill_player,
        }
    }
}

/// Serialize records as CSV with a header row.
pub fn write_csv<W: std::io::Write>(records: &[ExportRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

impl ProjectionEngine {
    /// Flatten every projection matching the filter into export records,
    /// sorted by fantasy points.
    pub async fn export_projections(
        &mut self,
        filter: &ProjectionFilter,
    ) -> Result<Vec<ExportRecord>> {
        let rows = self.db.list_projections(filter)?;
        let records: Vec<ExportRecord> = rows
            .par_iter()
            .map(|(projection, player)| ExportRecord::from_row(projection, player))
            .collect();
        Ok(records)
    }
}
