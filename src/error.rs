//! Error and rejection types
//!
//! Player actions that the rules refuse are ordinary outcomes, not failures:
//! they come back as [`ActionError`] and leave the simulation untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a tower cannot be placed at a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    #[error("position is not finite")]
    NonFinite,
    #[error("too close to the enemy path")]
    TooCloseToPath,
    #[error("too close to another tower")]
    TooCloseToTower,
}

/// A player action the simulation refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("not enough money: need {needed}, have {available}")]
    InsufficientFunds { needed: i32, available: i32 },
    #[error("invalid placement: {0}")]
    InvalidPlacement(#[from] PlacementError),
    #[error("no tower selected")]
    NoTowerSelected,
    #[error("no such tower")]
    UnknownTower,
    #[error("game is over")]
    GameOver,
    #[error("a wave is already in progress")]
    WaveInProgress,
}

/// Invalid enemy route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),
    #[error("waypoint {index} repeats the previous waypoint")]
    DuplicateWaypoint { index: usize },
    #[error("waypoint {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Failure to load balance tables, preferences or maps
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value: {0}")]
    Invalid(String),
    #[error("unknown map '{0}'")]
    UnknownMap(String),
    #[error(transparent)]
    Path(#[from] PathError),
}
