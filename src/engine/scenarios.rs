//! Scenario lifecycle: create, clone, delete, compare.

use super::ProjectionEngine;
use crate::error::{GridironError, Result};
use crate::stats::fields;
use crate::storage::models::Scenario;
use crate::storage::ProjectionFilter;
use crate::types::{PlayerId, Position, ScenarioId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One player's stat vectors across the compared scenarios. A player
/// missing from a scenario simply has no entry for that scenario name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerComparison {
    pub player_id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub values: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Result of comparing a list of scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenarios: Vec<ScenarioSummary>,
    pub players: Vec<PlayerComparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario_id: ScenarioId,
    pub name: String,
}

impl ProjectionEngine {
    /// Create an empty scenario.
    pub async fn create_scenario(
        &mut self,
        name: &str,
        description: Option<&str>,
        base_scenario_id: Option<&ScenarioId>,
        season: u16,
        parameters: Option<serde_json::Value>,
    ) -> Result<Scenario> {
        if let Some(base) = base_scenario_id {
            if self.db.get_scenario(base)?.is_none() {
                return Err(GridironError::ScenarioNotFound {
                    scenario_id: base.to_string(),
                });
            }
        }
        let scenario = self
            .db
            .insert_scenario(name, description, base_scenario_id, season, parameters)?;
        info!(scenario = %scenario.scenario_id, name, "created scenario");
        Ok(scenario)
    }

    /// List all scenarios.
    pub async fn list_scenarios(&mut self) -> Result<Vec<Scenario>> {
        self.db.list_scenarios()
    }

    /// Fetch one scenario.
    pub async fn get_scenario(&mut self, scenario_id: &ScenarioId) -> Result<Scenario> {
        self.db
            .get_scenario(scenario_id)?
            .ok_or_else(|| GridironError::ScenarioNotFound {
                scenario_id: scenario_id.to_string(),
            })
    }

    /// Clone a scenario: deep-copy every projection and override under a
    /// new scenario id, atomically.
    pub async fn clone_scenario(
        &mut self,
        source: &ScenarioId,
        new_name: &str,
    ) -> Result<Scenario> {
        let scenario = self.db.clone_scenario(source, new_name)?;
        info!(
            source = %source,
            clone = %scenario.scenario_id,
            name = new_name,
            "cloned scenario"
        );
        Ok(scenario)
    }

    /// Delete a scenario, cascading to projections and overrides.
    pub async fn delete_scenario(&mut self, scenario_id: &ScenarioId) -> Result<()> {
        self.db.delete_scenario_cascade(scenario_id)?;
        self.cache.invalidate(scenario_id.as_str());
        info!(scenario = %scenario_id, "deleted scenario");
        Ok(())
    }

    /// Compare projections across scenarios, optionally filtered by
    /// position. Players appear when present in at least one listed
    /// scenario; absence from a scenario is an empty map, not zeros.
    pub async fn compare_scenarios(
        &mut self,
        scenario_ids: &[ScenarioId],
        position: Option<Position>,
    ) -> Result<ScenarioComparison> {
        let cache_key = format!(
            "compare:{}:{}",
            scenario_ids
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(","),
            position.map(|p| p.to_string()).unwrap_or_default()
        );
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(serde_json::from_value(cached)?);
        }

        let mut scenarios = Vec::with_capacity(scenario_ids.len());
        for scenario_id in scenario_ids {
            let scenario = self.get_scenario(scenario_id).await?;
            scenarios.push(ScenarioSummary {
                scenario_id: scenario_id.clone(),
                name: scenario.name,
            });
        }

        let mut players: BTreeMap<String, PlayerComparison> = BTreeMap::new();
        for summary in &scenarios {
            let filter = ProjectionFilter {
                scenario_id: Some(Some(summary.scenario_id.clone())),
                position,
                ..Default::default()
            };
            for (projection, player) in self.db.list_projections(&filter)? {
                let entry = players
                    .entry(player.player_id.as_str().to_string())
                    .or_insert_with(|| PlayerComparison {
                        player_id: player.player_id.clone(),
                        name: player.name.clone(),
                        team: player.team.clone(),
                        position: player.position,
                        values: BTreeMap::new(),
                    });

                let mut vector = BTreeMap::new();
                for stat in fields::permitted_stats(player.position) {
                    if let Some(value) = projection.stat(stat) {
                        vector.insert(stat.to_string(), value);
                    }
                }
                vector.insert("half_ppr".to_string(), projection.half_ppr);
                vector.insert("games".to_string(), projection.games as f64);
                entry.values.insert(summary.name.clone(), vector);
            }
        }

        let comparison = ScenarioComparison {
            scenarios,
            players: players.into_values().collect(),
        };
        self.cache
            .put(&cache_key, serde_json::to_value(&comparison)?);
        Ok(comparison)
    }

    /// Create a scenario from a template: clone the base scenario, then
    /// apply a global adjustment map to every projection and per-player
    /// maps on top. Used by the batch surface.
    pub async fn create_scenario_from_template(
        &mut self,
        name: &str,
        base_scenario_id: &ScenarioId,
        global_adjustments: &std::collections::HashMap<String, f64>,
        player_adjustments: &std::collections::HashMap<PlayerId, std::collections::HashMap<String, f64>>,
    ) -> Result<Scenario> {
        let scenario = self.clone_scenario(base_scenario_id, name).await?;

        let filter = ProjectionFilter {
            scenario_id: Some(Some(scenario.scenario_id.clone())),
            include_fill_players: false,
            ..Default::default()
        };
        let rows = self.db.list_projections(&filter)?;
        for (projection, player) in rows {
            if !global_adjustments.is_empty() {
                self.update_projection(&projection.projection_id, global_adjustments)
                    .await?;
            }
            if let Some(adjustments) = player_adjustments.get(&player.player_id) {
                self.update_projection(&projection.projection_id, adjustments)
                    .await?;
            }
        }

        // Reads keyed on this scenario may have cached mid-build state.
        self.cache.invalidate(scenario.scenario_id.as_str());
        Ok(scenario)
    }
}
