//! Tower Defense - simulation core for a browser tower-defense game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (waves, towers, projectiles, economy)
//! - `config`: Data-driven game balance
//! - `settings`: Player preferences (sound, auto-start, speed)
//! - `maps`: Built-in enemy routes
//!
//! Rendering, audio playback and input devices live outside this crate. The
//! simulation reports what should be shown or heard through [`sim::GameEvent`].

pub mod config;
pub mod error;
pub mod maps;
pub mod settings;
pub mod sim;

pub use config::GameConfig;
pub use error::{ActionError, ConfigError, PathError, PlacementError};
pub use settings::Settings;
pub use sim::Simulation;

use glam::Vec2;

/// Simulation timing and geometry constants
pub mod consts {
    /// Nominal frame length fed by the headless runner (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest real frame delta accepted by a single tick (after a stall or a hidden tab)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Longest simulation step; speed-scaled frames are split into steps no longer than this
    pub const SIM_STEP_MS: f32 = FRAME_MS;
    /// Upper bound on steps per tick (`MAX_FRAME_MS * MAX_SPEED / SIM_STEP_MS` is 54)
    pub const MAX_SUBSTEPS: u32 = 64;

    /// Game speed bounds
    pub const MIN_SPEED: u32 = 1;
    pub const MAX_SPEED: u32 = 9;

    /// Half of the 40x40 tower footprint, used for click hit-testing
    pub const TOWER_HALF_SIZE: f32 = 20.0;
}

/// Angle of the vector pointing from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
