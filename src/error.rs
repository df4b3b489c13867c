//! Error types for the projection engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GridironError>;

#[derive(Error, Debug)]
pub enum GridironError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Projection not found: {projection_id}")]
    ProjectionNotFound { projection_id: String },

    #[error("Scenario not found: {scenario_id}")]
    ScenarioNotFound { scenario_id: String },

    #[error("Override not found: {override_id}")]
    OverrideNotFound { override_id: String },

    #[error("Team stats not found for {team} in {season}")]
    TeamContextMissing { team: String, season: u16 },

    #[error("Not enough history for player {player_id} before {season}")]
    NotEnoughHistory { player_id: String, season: u16 },

    #[error("No rookie template for {position} pick {draft_pick}")]
    RookieRequiresTemplate { position: String, draft_pick: u16 },

    #[error("Stat '{stat_name}' is not valid for position {position}")]
    StatNameInvalid { stat_name: String, position: String },

    #[error("Position mismatch for player {player_id}: expected one of {expected}")]
    PositionMismatch { player_id: String, expected: String },

    #[error("Adjustment '{factor}'={value} outside valid range [{min}, {max}]")]
    AdjustmentOutOfRange {
        factor: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid position: {position}")]
    InvalidPosition { position: String },

    #[error("Confidence level {confidence} not supported")]
    UnsupportedConfidence { confidence: f64 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal invariant violated: {message}")]
    Internal { message: String },
}

impl GridironError {
    /// True for the precondition family: the request is well-formed but the
    /// data needed to satisfy it is missing.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GridironError::NotEnoughHistory { .. }
                | GridironError::TeamContextMissing { .. }
                | GridironError::RookieRequiresTemplate { .. }
                | GridironError::PositionMismatch { .. }
        )
    }

    /// True for the invalid-input family: the caller supplied something the
    /// engine refuses to act on.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            GridironError::StatNameInvalid { .. }
                | GridironError::AdjustmentOutOfRange { .. }
                | GridironError::InvalidPosition { .. }
                | GridironError::UnsupportedConfidence { .. }
                | GridironError::InvalidInput { .. }
        )
    }
}
