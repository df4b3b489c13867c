//! Multi-element operations with per-element status.
//!
//! Batches are not atomic across elements: each element runs in its own
//! transaction, failures are reported in the envelope without failing the
//! batch, and a cancellation flag stops between elements while leaving
//! committed work committed.

use super::ProjectionEngine;
use crate::error::Result;
use crate::storage::models::{Projection, Scenario};
use crate::types::{PlayerId, ProjectionId, ScenarioId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// One failed element of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchElementError {
    pub key: String,
    pub error: String,
}

/// Envelope for a batch: the successes plus per-element failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchElementError>,
    pub cancelled: bool,
}

impl<T> BatchOutcome<T> {
    fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            cancelled: false,
        }
    }
}

/// Template for creating one scenario in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    pub name: String,
    pub base_scenario_id: ScenarioId,
    #[serde(default)]
    pub global_adjustments: HashMap<String, f64>,
    #[serde(default)]
    pub player_adjustments: HashMap<PlayerId, HashMap<String, f64>>,
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false)
}

impl ProjectionEngine {
    /// Build baselines for many players. Rookie players route through the
    /// template path automatically.
    pub async fn batch_create_projections(
        &mut self,
        player_ids: &[PlayerId],
        season: u16,
        scenario_id: Option<&ScenarioId>,
        cancel: Option<&AtomicBool>,
    ) -> Result<BatchOutcome<Projection>> {
        let mut outcome = BatchOutcome::new();
        for player_id in player_ids {
            if is_cancelled(cancel) {
                outcome.cancelled = true;
                break;
            }
            let is_rookie = self
                .db
                .get_player(player_id)?
                .map(|p| p.is_rookie || p.status == crate::types::PlayerStatus::Rookie)
                .unwrap_or(false);
            let result = if is_rookie {
                self.build_rookie_projection(player_id, season, scenario_id)
                    .await
            } else {
                self.create_base_projection(player_id, season, scenario_id)
                    .await
            };
            match result {
                Ok(projection) => outcome.succeeded.push(projection),
                Err(e) => outcome.failed.push(BatchElementError {
                    key: player_id.to_string(),
                    error: e.to_string(),
                }),
            }
        }
        log_outcome("batch create projections", &outcome);
        Ok(outcome)
    }

    /// Apply per-projection adjustment maps to many projections.
    pub async fn batch_adjust_projections(
        &mut self,
        adjustments: &[(ProjectionId, HashMap<String, f64>)],
        cancel: Option<&AtomicBool>,
    ) -> Result<BatchOutcome<Projection>> {
        let mut outcome = BatchOutcome::new();
        for (projection_id, factors) in adjustments {
            if is_cancelled(cancel) {
                outcome.cancelled = true;
                break;
            }
            match self.update_projection(projection_id, factors).await {
                Ok(projection) => outcome.succeeded.push(projection),
                Err(e) => outcome.failed.push(BatchElementError {
                    key: projection_id.to_string(),
                    error: e.to_string(),
                }),
            }
        }
        log_outcome("batch adjust projections", &outcome);
        Ok(outcome)
    }

    /// Create many scenarios from templates, each cloned from its base
    /// scenario with global and per-player adjustments applied.
    pub async fn batch_create_scenarios(
        &mut self,
        templates: &[ScenarioTemplate],
        cancel: Option<&AtomicBool>,
    ) -> Result<BatchOutcome<Scenario>> {
        let mut outcome = BatchOutcome::new();
        for template in templates {
            if is_cancelled(cancel) {
                outcome.cancelled = true;
                break;
            }
            let result = self
                .create_scenario_from_template(
                    &template.name,
                    &template.base_scenario_id,
                    &template.global_adjustments,
                    &template.player_adjustments,
                )
                .await;
            match result {
                Ok(scenario) => outcome.succeeded.push(scenario),
                Err(e) => outcome.failed.push(BatchElementError {
                    key: template.name.clone(),
                    error: e.to_string(),
                }),
            }
        }
        log_outcome("batch create scenarios", &outcome);
        Ok(outcome)
    }
}

fn log_outcome<T>(operation: &str, outcome: &BatchOutcome<T>) {
    if outcome.failed.is_empty() && !outcome.cancelled {
        info!(
            operation,
            succeeded = outcome.succeeded.len(),
            "batch complete"
        );
    } else {
        warn!(
            operation,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            cancelled = outcome.cancelled,
            "batch finished with failures"
        );
    }
}
