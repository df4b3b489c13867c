//! Per-stat variance model and correlated fantasy-point variance.
//!
//! Each position carries default coefficients of variation per stat; when a
//! player has at least eight games of history in the previous three seasons
//! the empirical game-to-game CV replaces the default for that stat.
//! Fantasy-point variance combines the scoring weights with a per-position
//! correlation matrix between the component stats.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::scoring;
use crate::stats::rates;
use crate::storage::models::Projection;
use crate::types::{Position, ProjectionId, ScenarioId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Supported confidence levels and their z-scores.
const CONFIDENCE_Z: [(f64, f64); 5] = [
    (0.50, 0.674),
    (0.80, 1.282),
    (0.90, 1.645),
    (0.95, 1.960),
    (0.99, 2.576),
];

/// Minimum game sample before the empirical CV replaces the default.
const MIN_GAMES_FOR_EMPIRICAL_CV: usize = 8;

/// Fallback CV for stats without a table entry.
const DEFAULT_CV: f64 = 0.30;

/// Half-PPR weights of the stats that contribute fantasy-point variance.
const FP_WEIGHTS: [(&str, f64); 8] = [
    ("pass_yards", scoring::PASS_YARD_WEIGHT),
    ("pass_td", scoring::PASS_TD_WEIGHT),
    ("interceptions", scoring::INTERCEPTION_WEIGHT),
    ("rush_yards", scoring::RUSH_YARD_WEIGHT),
    ("rush_td", scoring::RUSH_TD_WEIGHT),
    ("receptions", 0.5),
    ("rec_yards", scoring::REC_YARD_WEIGHT),
    ("rec_td", scoring::REC_TD_WEIGHT),
];

/// Stats the variance model covers for a position.
pub fn variance_stats(position: Position) -> &'static [&'static str] {
    match position {
        Position::QB => &[
            "pass_attempts",
            "completions",
            "pass_yards",
            "pass_td",
            "interceptions",
            "rush_attempts",
            "rush_yards",
            "rush_td",
        ],
        Position::RB | Position::WR | Position::TE => &[
            "rush_attempts",
            "rush_yards",
            "rush_td",
            "targets",
            "receptions",
            "rec_yards",
            "rec_td",
        ],
    }
}

/// Default coefficient of variation per (position, stat).
fn default_cv(position: Position, stat: &str) -> f64 {
    let table: &[(&str, f64)] = match position {
        Position::QB => &[
            ("pass_attempts", 0.12),
            ("completions", 0.15),
            ("pass_yards", 0.18),
            ("pass_td", 0.25),
            ("interceptions", 0.35),
            ("rush_attempts", 0.30),
            ("rush_yards", 0.35),
            ("rush_td", 0.50),
        ],
        Position::RB => &[
            ("rush_attempts", 0.18),
            ("rush_yards", 0.22),
            ("rush_td", 0.40),
            ("targets", 0.25),
            ("receptions", 0.28),
            ("rec_yards", 0.32),
            ("rec_td", 0.45),
        ],
        Position::WR => &[
            ("targets", 0.20),
            ("receptions", 0.25),
            ("rec_yards", 0.30),
            ("rec_td", 0.45),
            ("rush_attempts", 0.50),
            ("rush_yards", 0.50),
            ("rush_td", 0.70),
        ],
        Position::TE => &[
            ("targets", 0.25),
            ("receptions", 0.30),
            ("rec_yards", 0.35),
            ("rec_td", 0.50),
            ("rush_attempts", 0.80),
            ("rush_yards", 0.80),
            ("rush_td", 0.95),
        ],
    };
    table
        .iter()
        .find(|(name, _)| *name == stat)
        .map(|(_, cv)| *cv)
        .unwrap_or(DEFAULT_CV)
}

/// Correlation between two stats for a position; symmetric in (a, b).
fn correlation(position: Position, a: &str, b: &str) -> f64 {
    let table: &[((&str, &str), f64)] = match position {
        Position::QB => &[
            (("pass_attempts", "completions"), 0.97),
            (("pass_attempts", "pass_yards"), 0.92),
            (("pass_attempts", "pass_td"), 0.75),
            (("pass_attempts", "interceptions"), 0.65),
            (("completions", "pass_yards"), 0.94),
            (("completions", "pass_td"), 0.78),
            (("pass_yards", "pass_td"), 0.80),
            (("rush_attempts", "rush_yards"), 0.95),
            (("rush_attempts", "rush_td"), 0.55),
            (("rush_yards", "rush_td"), 0.60),
        ],
        Position::RB => &[
            (("rush_attempts", "rush_yards"), 0.98),
            (("rush_attempts", "rush_td"), 0.75),
            (("rush_yards", "rush_td"), 0.70),
            (("targets", "receptions"), 0.95),
            (("receptions", "rec_yards"), 0.97),
            (("receptions", "rec_td"), 0.60),
            (("rec_yards", "rec_td"), 0.65),
            (("rush_attempts", "targets"), -0.20),
            (("rush_yards", "rec_yards"), -0.15),
        ],
        Position::WR | Position::TE => &[
            (("targets", "receptions"), 0.97),
            (("targets", "rec_yards"), 0.92),
            (("targets", "rec_td"), 0.75),
            (("receptions", "rec_yards"), 0.95),
            (("receptions", "rec_td"), 0.70),
            (("rec_yards", "rec_td"), 0.75),
            (("rush_attempts", "rush_yards"), 0.90),
            (("rush_yards", "rush_td"), 0.60),
        ],
    };
    table
        .iter()
        .find(|((x, y), _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, rho)| *rho)
        .unwrap_or(0.0)
}

/// Snap a requested confidence level to the closest supported one.
fn choose_confidence(confidence: f64) -> Result<(f64, f64)> {
    if !(0.0..1.0).contains(&confidence) || confidence == 0.0 {
        return Err(GridironError::UnsupportedConfidence { confidence });
    }
    let (level, z) = CONFIDENCE_Z
        .iter()
        .min_by(|(a, _), (b, _)| {
            (a - confidence)
                .abs()
                .partial_cmp(&(b - confidence).abs())
                .expect("finite confidence levels")
        })
        .expect("non-empty z table");
    Ok((*level, *z))
}

fn interval_key(level: f64) -> String {
    format!("{:.2}", level)
}

/// Confidence interval for one stat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VarianceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Variance summary for one stat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatVariance {
    pub mean: f64,
    pub std_dev: f64,
    pub coef_var: f64,
    pub intervals: BTreeMap<String, VarianceInterval>,
}

/// Variance for every covered stat on a projection, including the
/// correlated `half_ppr` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceResult {
    pub projection_id: ProjectionId,
    pub stats: BTreeMap<String, StatVariance>,
}

/// Ids of the scenarios materialized for a projection range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeScenarios {
    pub low: ScenarioId,
    pub high: ScenarioId,
}

/// Low/median/high stat vectors at one confidence level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionRange {
    pub projection_id: ProjectionId,
    pub confidence: f64,
    pub low: BTreeMap<String, f64>,
    pub median: BTreeMap<String, f64>,
    pub high: BTreeMap<String, f64>,
    pub scenario_ids: Option<RangeScenarios>,
}

fn population_cv(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean.max(1.0)
}

fn build_intervals(mean: f64, std_dev: f64) -> BTreeMap<String, VarianceInterval> {
    CONFIDENCE_Z
        .iter()
        .map(|(level, z)| {
            (
                interval_key(*level),
                VarianceInterval {
                    lower: (mean - z * std_dev).max(0.0),
                    upper: mean + z * std_dev,
                },
            )
        })
        .collect()
}

impl ProjectionEngine {
    /// Per-stat CV coefficients for a player: defaults overlaid with the
    /// empirical game-to-game CV wherever the sample is large enough.
    async fn variance_model(
        &mut self,
        player_id: &crate::types::PlayerId,
        position: Position,
        season: u16,
    ) -> Result<HashMap<&'static str, f64>> {
        let mut model = HashMap::new();
        for stat in variance_stats(position) {
            let games =
                self.db
                    .get_game_values(player_id, stat, season.saturating_sub(3), season - 1)?;
            if games.len() >= MIN_GAMES_FOR_EMPIRICAL_CV {
                model.insert(*stat, population_cv(&games));
            } else {
                model.insert(*stat, default_cv(position, stat));
            }
        }
        Ok(model)
    }

    /// Variance and confidence intervals for every covered stat of a
    /// projection. Full-season intervals rescale short-season sigma by
    /// sqrt(17)/sqrt(games).
    pub async fn calculate_variance(
        &mut self,
        projection_id: &ProjectionId,
        adjust_for_games: bool,
        use_historical: bool,
    ) -> Result<VarianceResult> {
        let projection = self
            .db
            .get_projection(projection_id)?
            .ok_or_else(|| GridironError::ProjectionNotFound {
                projection_id: projection_id.to_string(),
            })?;
        if projection.is_fill_player {
            return Err(GridironError::InvalidInput {
                message: "fill-player projections are excluded from variance".to_string(),
            });
        }
        let player = self
            .db
            .get_player(&projection.player_id)?
            .ok_or_else(|| GridironError::PlayerNotFound {
                player_id: projection.player_id.to_string(),
            })?;

        let model = if use_historical {
            self.variance_model(&player.player_id, player.position, projection.season)
                .await?
        } else {
            variance_stats(player.position)
                .iter()
                .map(|stat| (*stat, default_cv(player.position, stat)))
                .collect()
        };

        let games_rescale = if adjust_for_games && projection.games > 0 && projection.games < 17 {
            (17.0f64).sqrt() / (projection.games as f64).sqrt()
        } else {
            1.0
        };

        let mut stats: BTreeMap<String, StatVariance> = BTreeMap::new();
        for stat in variance_stats(player.position) {
            let Some(value) = projection.stat(stat) else {
                continue;
            };
            if value <= 0.0 {
                continue;
            }
            let coef = model
                .get(stat)
                .copied()
                .unwrap_or_else(|| default_cv(player.position, stat));
            let std_dev = value * coef * games_rescale;
            stats.insert(
                stat.to_string(),
                StatVariance {
                    mean: value,
                    std_dev,
                    coef_var: coef,
                    intervals: build_intervals(value, std_dev),
                },
            );
        }

        // Fantasy points: weighted variance sum with pairwise correlation.
        let mut fp_variance = 0.0;
        for (i, (stat_a, weight_a)) in FP_WEIGHTS.iter().enumerate() {
            let Some(var_a) = stats.get(*stat_a) else {
                continue;
            };
            fp_variance += weight_a.powi(2) * var_a.std_dev.powi(2);
            for (stat_b, weight_b) in FP_WEIGHTS.iter().skip(i + 1) {
                let Some(var_b) = stats.get(*stat_b) else {
                    continue;
                };
                let rho = correlation(player.position, stat_a, stat_b);
                fp_variance += 2.0 * weight_a * weight_b * rho * var_a.std_dev * var_b.std_dev;
            }
        }
        let fp_std_dev = fp_variance.max(0.0).sqrt();
        let fp_mean = projection.half_ppr;
        stats.insert(
            "half_ppr".to_string(),
            StatVariance {
                mean: fp_mean,
                std_dev: fp_std_dev,
                coef_var: if fp_mean > 0.0 { fp_std_dev / fp_mean } else { 0.0 },
                intervals: build_intervals(fp_mean, fp_std_dev),
            },
        );

        Ok(VarianceResult {
            projection_id: projection_id.clone(),
            stats,
        })
    }

    /// Low/median/high stat vectors for a projection at a confidence
    /// level. With `materialize_scenarios`, also persists "<player> Low"
    /// and "<player> High" scenarios holding the bound projections.
    pub async fn generate_projection_range(
        &mut self,
        projection_id: &ProjectionId,
        confidence: f64,
        materialize_scenarios: bool,
    ) -> Result<ProjectionRange> {
        let (level, _z) = choose_confidence(confidence)?;
        let projection = self
            .db
            .get_projection(projection_id)?
            .ok_or_else(|| GridironError::ProjectionNotFound {
                projection_id: projection_id.to_string(),
            })?;

        let cache_key = format!(
            "range:{}:{}:{:.2}",
            projection.player_id, projection_id, level
        );
        if !materialize_scenarios {
            if let Some(cached) = self.cache.get(&cache_key) {
                return Ok(serde_json::from_value(cached)?);
            }
        }

        let variance = self.calculate_variance(projection_id, true, true).await?;
        let key = interval_key(level);

        let mut range = ProjectionRange {
            projection_id: projection_id.clone(),
            confidence: level,
            low: BTreeMap::new(),
            median: BTreeMap::new(),
            high: BTreeMap::new(),
            scenario_ids: None,
        };
        for (stat, stat_variance) in &variance.stats {
            let Some(interval) = stat_variance.intervals.get(&key) else {
                continue;
            };
            range.low.insert(stat.clone(), interval.lower);
            range.median.insert(stat.clone(), stat_variance.mean);
            range.high.insert(stat.clone(), interval.upper);
        }

        if materialize_scenarios {
            let player = self
                .db
                .get_player(&projection.player_id)?
                .ok_or_else(|| GridironError::PlayerNotFound {
                    player_id: projection.player_id.to_string(),
                })?;
            let low = self
                .materialize_bound(&projection, &player.name, "Low", level, &range.low)
                .await?;
            let high = self
                .materialize_bound(&projection, &player.name, "High", level, &range.high)
                .await?;
            range.scenario_ids = Some(RangeScenarios { low, high });
            info!(player = %player.name, confidence = level, "materialized range scenarios");
        } else {
            self.cache.put(&cache_key, serde_json::to_value(&range)?);
        }

        Ok(range)
    }

    /// Persist one bound of a range as a scenario holding a copy of the
    /// projection with the bound's counting stats. Rates re-derive from the
    /// bound values so the stored projection stays internally consistent.
    async fn materialize_bound(
        &mut self,
        projection: &Projection,
        player_name: &str,
        label: &str,
        confidence: f64,
        bound: &BTreeMap<String, f64>,
    ) -> Result<ScenarioId> {
        let scenario = self
            .create_scenario(
                &format!("{} {}", player_name, label),
                Some(&format!(
                    "{}-end projection ({:.0}% confidence interval range)",
                    label,
                    confidence * 100.0
                )),
                projection.scenario_id.as_ref(),
                projection.season,
                None,
            )
            .await?;

        let mut bound_projection = projection.clone();
        bound_projection.projection_id = ProjectionId::new("");
        bound_projection.scenario_id = Some(scenario.scenario_id.clone());
        for (stat, value) in bound {
            if stat == "half_ppr" {
                continue;
            }
            bound_projection.set_stat(stat, Some(*value));
        }
        rates::derive_rates(&mut bound_projection)?;
        bound_projection.half_ppr = scoring::half_ppr(&bound_projection);
        self.db.insert_projection(&mut bound_projection)?;

        Ok(scenario.scenario_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_snapping() {
        assert_eq!(choose_confidence(0.80).unwrap(), (0.80, 1.282));
        assert_eq!(choose_confidence(0.82).unwrap(), (0.80, 1.282));
        assert_eq!(choose_confidence(0.93).unwrap(), (0.95, 1.960));
        assert!(choose_confidence(0.0).is_err());
        assert!(choose_confidence(1.5).is_err());
    }

    #[test]
    fn test_default_cv_tables() {
        assert_eq!(default_cv(Position::QB, "pass_yards"), 0.18);
        assert_eq!(default_cv(Position::RB, "rush_td"), 0.40);
        assert_eq!(default_cv(Position::WR, "rec_td"), 0.45);
        assert_eq!(default_cv(Position::TE, "rush_td"), 0.95);
        // Unknown stat falls back.
        assert_eq!(default_cv(Position::QB, "fumbles"), DEFAULT_CV);
    }

    #[test]
    fn test_correlation_symmetry() {
        assert_eq!(
            correlation(Position::QB, "pass_attempts", "pass_yards"),
            correlation(Position::QB, "pass_yards", "pass_attempts")
        );
        assert_eq!(correlation(Position::RB, "targets", "receptions"), 0.95);
        assert_eq!(correlation(Position::RB, "rush_attempts", "targets"), -0.20);
        assert_eq!(correlation(Position::WR, "targets", "interceptions"), 0.0);
    }

    #[test]
    fn test_population_cv() {
        let values = vec![10.0, 10.0, 10.0, 10.0];
        assert!((population_cv(&values) - 0.0).abs() < 1e-9);

        let values = vec![8.0, 12.0];
        // mean 10, population std 2
        assert!((population_cv(&values) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_intervals_clamp_at_zero() {
        let intervals = build_intervals(5.0, 10.0);
        let wide = intervals.get("0.95").unwrap();
        assert_eq!(wide.lower, 0.0);
        assert!(wide.upper > 5.0);
    }
}
