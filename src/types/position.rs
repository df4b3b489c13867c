//! Skill-position and roster-status types.

use crate::error::GridironError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Skill positions the engine projects.
///
/// The projection math is position-aware throughout: each position carries
/// its own permitted stat set, variance coefficients, and team-adjustment
/// rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
}

impl Position {
    /// All supported positions, in dispatch order.
    pub const ALL: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    /// True for the positions whose primary usage is receiving.
    pub fn is_receiver(&self) -> bool {
        matches!(self, Position::WR | Position::TE)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Position {
    type Err = GridironError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            _ => Err(GridironError::InvalidPosition {
                position: s.to_string(),
            }),
        }
    }
}

/// Roster status for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStatus {
    Active,
    Injured,
    Rookie,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerStatus::Active => "Active",
            PlayerStatus::Injured => "Injured",
            PlayerStatus::Rookie => "Rookie",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PlayerStatus {
    type Err = GridironError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(PlayerStatus::Active),
            "Injured" => Ok(PlayerStatus::Injured),
            "Rookie" => Ok(PlayerStatus::Rookie),
            _ => Err(GridironError::InvalidInput {
                message: format!("unknown player status '{}'", s),
            }),
        }
    }
}
