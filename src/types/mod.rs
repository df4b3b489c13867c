//! Core identifier and domain types shared across the engine.

pub mod ids;
pub mod position;

pub use ids::{OverrideId, PlayerId, ProjectionId, ScenarioId};
pub use position::{PlayerStatus, Position};
