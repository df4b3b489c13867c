//! Storage layer for the projection engine
//!
//! This module provides a clean abstraction over the SQLite database,
//! organized into logical components:
//! - `models`: Data structures
//! - `schema`: Database connection and schema management
//! - `queries`: Player, team-context, and historical-stat operations
//! - `projections`: Projection, scenario, and override persistence

pub mod models;
pub mod projections;
pub mod queries;
pub mod schema;

#[cfg(test)]
mod tests;

// Re-export the main types and database struct for easy access
pub use models::*;
pub use projections::ProjectionFilter;
pub use schema::{ProjectionDatabase, DATA_DIR_ENV_VAR};
