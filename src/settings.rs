//! Player preferences
//!
//! Read once when the game starts and written back whenever the player
//! toggles something. Where the JSON lives (cookie, LocalStorage, file) is
//! the host's business.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SPEED, MIN_SPEED};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sound effects on/off
    pub sound_enabled: bool,
    /// Start the next wave automatically after the previous one is cleared
    pub auto_start_waves: bool,
    /// Game speed multiplier (1-9)
    pub game_speed: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            auto_start_waves: false,
            game_speed: 1,
        }
    }
}

impl Settings {
    /// Flip sound on/off, returning the new value
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    /// Flip auto-start on/off, returning the new value
    pub fn toggle_auto_start(&mut self) -> bool {
        self.auto_start_waves = !self.auto_start_waves;
        self.auto_start_waves
    }

    /// Speed clamped to the supported range
    pub fn effective_speed(&self) -> u32 {
        self.game_speed.clamp(MIN_SPEED, MAX_SPEED)
    }

    /// Load settings from stored JSON, falling back to defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring stored settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Serialize for the host to store
    pub fn to_json(&self) -> String {
        // A struct of bools and integers always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}
