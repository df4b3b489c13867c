//! Projection engine operations.
//!
//! [`ProjectionEngine`] owns the store and the result cache; each submodule
//! contributes one operation family as an `impl` block, mirroring the split
//! of the storage layer:
//! - `baseline`: historical stats + team context -> initial projection
//! - `adjust`: bounded multiplicative factors at player scope
//! - `team`: team-level factor bundles propagated per position
//! - `overrides`: manual stat replacement with cascade
//! - `scenarios`: named projection sets, clone and compare
//! - `variance`: per-stat CV model and confidence bands
//! - `rookies`: template-driven projections for players with no history
//! - `reconcile`: fill players closing the gap to team totals
//! - `batch`: multi-element operations with per-element status

pub mod adjust;
pub mod baseline;
pub mod batch;
pub mod overrides;
pub mod reconcile;
pub mod rookies;
pub mod scenarios;
pub mod team;
pub mod variance;

use crate::cache::ResultCache;
use crate::storage::ProjectionDatabase;
use crate::types::ScenarioId;

pub use adjust::adjustment_range;
pub use batch::{BatchElementError, BatchOutcome, ScenarioTemplate};
pub use overrides::{BatchOverrideRequest, BatchOverrideResult, OverrideValue};
pub use rookies::{find_template, templates_for_position, RookieProjectionTemplate};
pub use scenarios::{PlayerComparison, ScenarioComparison, ScenarioSummary};
pub use team::TeamAdjustmentFactors;
pub use variance::{ProjectionRange, RangeScenarios, StatVariance, VarianceResult};

/// The projection engine: storage plus a process-wide result cache.
pub struct ProjectionEngine {
    pub db: ProjectionDatabase,
    pub(crate) cache: ResultCache,
}

impl ProjectionEngine {
    pub fn new(db: ProjectionDatabase) -> Self {
        Self {
            db,
            cache: ResultCache::default(),
        }
    }

    pub fn with_cache(db: ProjectionDatabase, cache: ResultCache) -> Self {
        Self { db, cache }
    }

    /// Read access to the result cache (stats, tests).
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Invalidate cached reads touched by a write against the given player
    /// and scenario scope. The baseline scope uses a fixed tag so baseline
    /// reads can be keyed and invalidated like scenario reads.
    pub(crate) fn invalidate_scope(&self, player_id: &str, scenario_id: Option<&ScenarioId>) {
        let removed = self.cache.invalidate(player_id)
            + match scenario_id {
                Some(id) => self.cache.invalidate(id.as_str()),
                None => self.cache.invalidate(baseline_tag()),
            };
        if removed > 0 {
            tracing::debug!(player_id, removed, "invalidated cached reads");
        }
    }
}

/// Cache tag standing in for the NULL scenario id.
pub(crate) fn baseline_tag() -> &'static str {
    "scenario-baseline"
}
