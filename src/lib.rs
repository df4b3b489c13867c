//! Gridiron: a season-level fantasy football projection engine.
//!
//! Builds baselines from historical stats and team context, applies bounded
//! adjustments at player and team scope, manages manual overrides with
//! cascade semantics, groups what-if work into scenarios, and reads finished
//! projections for variance bands, fill-player reconciliation, and export.

pub mod cache;
pub mod cli;
pub mod engine;
pub mod error;
pub mod export;
pub mod scoring;
pub mod stats;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use engine::ProjectionEngine;
pub use error::{GridironError, Result};
pub use storage::{ProjectionDatabase, ProjectionFilter, DATA_DIR_ENV_VAR};
pub use types::{OverrideId, PlayerId, PlayerStatus, Position, ProjectionId, ScenarioId};
