//! Built-in maps
//!
//! Each map is an enemy route in simulation space (1200x800 arena).

use glam::Vec2;
use serde::Serialize;

use crate::error::ConfigError;
use crate::sim::PathModel;

/// Advertised difficulty of a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// A selectable map
#[derive(Debug, Clone, Serialize)]
pub struct MapDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
    pub waypoints: &'static [(f32, f32)],
}

impl MapDef {
    /// Build the route for this map
    pub fn path(&self) -> Result<PathModel, ConfigError> {
        let points = self.waypoints.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        Ok(PathModel::new(points)?)
    }
}

const MAPS: &[MapDef] = &[
    MapDef {
        id: "classic",
        name: "Classic Route",
        description: "The classic tower defense path",
        difficulty: Difficulty::Easy,
        waypoints: &[
            (0.0, 400.0),
            (200.0, 400.0),
            (200.0, 200.0),
            (400.0, 200.0),
            (400.0, 500.0),
            (600.0, 500.0),
            (600.0, 300.0),
            (800.0, 300.0),
            (800.0, 400.0),
            (1000.0, 400.0),
            (1000.0, 200.0),
            (1200.0, 200.0),
        ],
    },
    MapDef {
        id: "serpentine",
        name: "Serpentine Valley",
        description: "A winding path through the valley",
        difficulty: Difficulty::Medium,
        waypoints: &[
            (0.0, 300.0),
            (150.0, 300.0),
            (150.0, 150.0),
            (300.0, 150.0),
            (300.0, 450.0),
            (450.0, 450.0),
            (450.0, 200.0),
            (600.0, 200.0),
            (600.0, 500.0),
            (750.0, 500.0),
            (750.0, 250.0),
            (900.0, 250.0),
            (900.0, 400.0),
            (1200.0, 400.0),
        ],
    },
    MapDef {
        id: "spiral",
        name: "Spiral Fortress",
        description: "Enemies spiral inward to the center",
        difficulty: Difficulty::Hard,
        waypoints: &[
            (0.0, 600.0),
            (1000.0, 600.0),
            (1000.0, 150.0),
            (200.0, 150.0),
            (200.0, 450.0),
            (800.0, 450.0),
            (800.0, 300.0),
            (400.0, 300.0),
            (400.0, 350.0),
            (600.0, 350.0),
            (600.0, 375.0),
        ],
    },
    MapDef {
        id: "crossroads",
        name: "Cross Roads",
        description: "Multiple paths converge at the center",
        difficulty: Difficulty::Expert,
        waypoints: &[
            (0.0, 200.0),
            (400.0, 200.0),
            (400.0, 400.0),
            (200.0, 400.0),
            (200.0, 600.0),
            (600.0, 600.0),
            (600.0, 300.0),
            (800.0, 300.0),
            (800.0, 500.0),
            (1000.0, 500.0),
            (1000.0, 100.0),
            (1200.0, 100.0),
        ],
    },
    MapDef {
        id: "default",
        name: "Default Map",
        description: "Compact layout for the narrower game area",
        difficulty: Difficulty::Easy,
        waypoints: &[
            (0.0, 400.0),
            (180.0, 400.0),
            (180.0, 200.0),
            (350.0, 200.0),
            (350.0, 500.0),
            (520.0, 500.0),
            (520.0, 300.0),
            (690.0, 300.0),
            (690.0, 400.0),
            (860.0, 400.0),
            (860.0, 200.0),
            (950.0, 200.0),
        ],
    },
    MapDef {
        id: "zigzag",
        name: "Zigzag Map",
        description: "A winding path with alternating high and low sections",
        difficulty: Difficulty::Medium,
        waypoints: &[
            (0.0, 400.0),
            (180.0, 400.0),
            (180.0, 200.0),
            (350.0, 200.0),
            (350.0, 600.0),
            (520.0, 600.0),
            (520.0, 150.0),
            (690.0, 150.0),
            (690.0, 650.0),
            (860.0, 650.0),
            (860.0, 300.0),
            (950.0, 300.0),
        ],
    },
];

/// All built-in maps, in menu order
pub fn all() -> &'static [MapDef] {
    MAPS
}

/// Look up a map by id
pub fn by_id(id: &str) -> Result<&'static MapDef, ConfigError> {
    MAPS.iter()
        .find(|map| map.id == id)
        .ok_or_else(|| ConfigError::UnknownMap(id.to_string()))
}
