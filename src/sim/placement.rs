//! Tower placement rules

use glam::Vec2;

use super::entities::Tower;
use super::path::PathModel;
use crate::config::GameSpec;
use crate::error::PlacementError;

/// Checks a candidate tower position against the path and existing towers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementValidator {
    /// Minimum distance from the path
    pub path_clearance: f32,
    /// Minimum distance between tower centres
    pub tower_radius: f32,
}

impl PlacementValidator {
    pub fn new(spec: &GameSpec) -> Self {
        Self {
            path_clearance: spec.path_clearance,
            tower_radius: spec.tower_placement_radius,
        }
    }

    /// Path clearance first, then spacing from other towers
    ///
    /// NaN or infinite coordinates fail every distance comparison, so they
    /// are rejected before either rule runs.
    pub fn check(&self, point: Vec2, path: &PathModel, towers: &[Tower]) -> Result<(), PlacementError> {
        if !point.is_finite() {
            return Err(PlacementError::NonFinite);
        }
        if path.distance_to_path(point) < self.path_clearance {
            return Err(PlacementError::TooCloseToPath);
        }
        if towers.iter().any(|t| t.pos.distance(point) < self.tower_radius) {
            return Err(PlacementError::TooCloseToTower);
        }
        Ok(())
    }

    pub fn can_place_tower(&self, point: Vec2, path: &PathModel, towers: &[Tower]) -> bool {
        self.check(point, path, towers).is_ok()
    }
}
