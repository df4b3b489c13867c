//! CLI argument definitions.

use crate::types::Position;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Season-level fantasy football projection engine.
#[derive(Debug, Parser)]
#[command(name = "gridiron", version, about)]
pub struct Gridiron {
    /// Data directory holding the projection database. Falls back to
    /// $GRIDIRON_DATA_DIR, then the platform data directory.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a baseline projection from a player's history.
    Baseline {
        #[arg(long)]
        player_id: String,
        #[arg(long)]
        season: u16,
        #[arg(long)]
        scenario: Option<String>,
    },

    /// Build a rookie projection from the draft-slot template.
    Rookie {
        #[arg(long)]
        player_id: String,
        #[arg(long)]
        season: u16,
        #[arg(long)]
        scenario: Option<String>,
    },

    /// List rookie templates for a position.
    Templates {
        #[arg(long)]
        position: Position,
    },

    /// Apply adjustment factors (factor=value pairs) to a projection.
    Adjust {
        #[arg(long)]
        projection_id: String,
        /// Factors such as pass_volume=1.05 td_rate=1.10
        #[arg(required = true, value_parser = parse_factor)]
        factors: Vec<(String, f64)>,
    },

    /// Apply a team-level factor bundle to every player projection.
    TeamAdjust {
        #[arg(long)]
        team: String,
        #[arg(long)]
        season: u16,
        #[arg(long)]
        scenario: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        pass_volume: f64,
        #[arg(long, default_value_t = 1.0)]
        rush_volume: f64,
        #[arg(long, default_value_t = 1.0)]
        pass_efficiency: f64,
        #[arg(long, default_value_t = 1.0)]
        rush_efficiency: f64,
        #[arg(long, default_value_t = 1.0)]
        scoring_rate: f64,
    },

    /// Override one stat on a projection.
    Override {
        #[arg(long)]
        projection_id: String,
        #[arg(long)]
        stat: String,
        #[arg(long)]
        value: f64,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete an override, restoring the computed value.
    DeleteOverride {
        #[arg(long)]
        override_id: String,
    },

    /// List overrides for a player or a projection.
    Overrides {
        #[arg(long, conflicts_with = "projection_id")]
        player_id: Option<String>,
        #[arg(long)]
        projection_id: Option<String>,
    },

    /// Scenario management.
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommands,
    },

    /// Per-stat variance and confidence intervals for a projection.
    Variance {
        #[arg(long)]
        projection_id: String,
    },

    /// Low/median/high projection range at a confidence level.
    Range {
        #[arg(long)]
        projection_id: String,
        #[arg(long, default_value_t = 0.80)]
        confidence: f64,
        /// Persist the low/high bounds as scenarios.
        #[arg(long)]
        materialize: bool,
    },

    /// Generate fill players so player sums reconcile to team totals.
    Reconcile {
        #[arg(long)]
        team: String,
        #[arg(long)]
        season: u16,
        #[arg(long)]
        scenario: Option<String>,
    },

    /// Export projections as JSON or CSV.
    Export {
        #[command(flatten)]
        filters: ExportFilters,
        /// Write CSV to stdout instead of JSON.
        #[arg(long)]
        csv: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScenarioCommands {
    /// Create an empty scenario.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        base_scenario_id: Option<String>,
        #[arg(long)]
        season: u16,
    },
    /// List scenarios.
    List,
    /// Deep-copy a scenario with its projections and overrides.
    Clone {
        #[arg(long)]
        source_id: String,
        #[arg(long)]
        name: String,
    },
    /// Delete a scenario and everything under it.
    Delete {
        #[arg(long)]
        scenario_id: String,
    },
    /// Compare players across scenarios.
    Compare {
        #[arg(long, required = true, num_args = 1..)]
        ids: Vec<String>,
        #[arg(long)]
        position: Option<Position>,
    },
}

#[derive(Debug, Args)]
pub struct ExportFilters {
    #[arg(long)]
    pub season: Option<u16>,
    #[arg(long)]
    pub position: Option<Position>,
    #[arg(long)]
    pub team: Option<String>,
    #[arg(long)]
    pub scenario: Option<String>,
    /// Restrict to the global baseline (scenario NULL).
    #[arg(long, conflicts_with = "scenario")]
    pub baseline_only: bool,
    #[arg(long)]
    pub half_ppr_min: Option<f64>,
    #[arg(long)]
    pub half_ppr_max: Option<f64>,
    #[arg(long)]
    pub include_fill_players: bool,
}

/// Parse a `factor=value` pair.
fn parse_factor(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected factor=value, got '{}'", raw))?;
    let value: f64 = value
        .parse()
        .map_err(|e| format!("bad value for '{}': {}", key, e))?;
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_factor() {
        assert_eq!(
            parse_factor("pass_volume=1.05").unwrap(),
            ("pass_volume".to_string(), 1.05)
        );
        assert!(parse_factor("pass_volume").is_err());
        assert!(parse_factor("pass_volume=abc").is_err());
    }

    #[test]
    fn test_cli_parses_baseline() {
        let cli = Gridiron::try_parse_from([
            "gridiron",
            "baseline",
            "--player-id",
            "abc",
            "--season",
            "2024",
        ])
        .unwrap();
        match cli.command {
            Commands::Baseline {
                player_id, season, ..
            } => {
                assert_eq!(player_id, "abc");
                assert_eq!(season, 2024);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_cli_parses_adjust_factors() {
        let cli = Gridiron::try_parse_from([
            "gridiron",
            "adjust",
            "--projection-id",
            "p1",
            "pass_volume=1.05",
            "td_rate=1.10",
        ])
        .unwrap();
        match cli.command {
            Commands::Adjust { factors, .. } => {
                assert_eq!(factors.len(), 2);
                assert_eq!(factors[0].0, "pass_volume");
            }
            _ => panic!("wrong command"),
        }
    }
}
