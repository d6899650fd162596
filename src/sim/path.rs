//! Enemy route geometry
//!
//! A polyline walked from the first waypoint to the last. Immutable once
//! built; one per map.

use glam::Vec2;
use serde::Serialize;

use crate::angle_between;
use crate::error::PathError;

/// A point sampled along the route, with the heading of its segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathPoint {
    pub position: Vec2,
    /// Heading in radians
    pub angle: f32,
    /// Index of the waypoint starting the segment this point lies on
    pub segment: usize,
}

/// The enemy route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathModel {
    waypoints: Vec<Vec2>,
    /// Distance along the route at which each waypoint sits
    cumulative: Vec<f32>,
}

impl PathModel {
    /// Build a route; needs at least two waypoints and no repeated neighbours
    pub fn new(waypoints: Vec<Vec2>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints(waypoints.len()));
        }
        if let Some(index) = waypoints.iter().position(|p| !p.is_finite()) {
            return Err(PathError::NonFinite { index });
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        cumulative.push(0.0);
        for (i, pair) in waypoints.windows(2).enumerate() {
            if pair[0] == pair[1] {
                return Err(PathError::DuplicateWaypoint { index: i + 1 });
            }
            let last = cumulative[i];
            cumulative.push(last + pair[0].distance(pair[1]));
        }

        Ok(Self {
            waypoints,
            cumulative,
        })
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Where enemies spawn
    pub fn start(&self) -> Vec2 {
        self.waypoints[0]
    }

    /// Where enemies leave the map
    pub fn end(&self) -> Vec2 {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn total_length(&self) -> f32 {
        self.cumulative[self.cumulative.len() - 1]
    }

    /// Minimum distance from `point` to any segment of the route
    pub fn distance_to_path(&self, point: Vec2) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| distance_to_segment(point, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min)
    }

    /// Point reached after travelling `distance` along the route
    ///
    /// Distances outside `0..=total_length` clamp to the endpoints.
    pub fn point_at_distance(&self, distance: f32) -> PathPoint {
        let distance = distance.clamp(0.0, self.total_length());
        // Index of the first waypoint strictly beyond `distance`
        let upper = self
            .cumulative
            .partition_point(|&d| d <= distance)
            .clamp(1, self.waypoints.len() - 1);
        let a = self.waypoints[upper - 1];
        let b = self.waypoints[upper];
        let seg_len = self.cumulative[upper] - self.cumulative[upper - 1];
        let t = (distance - self.cumulative[upper - 1]) / seg_len;
        PathPoint {
            position: a.lerp(b, t),
            angle: angle_between(a, b),
            segment: upper - 1,
        }
    }
}

/// Distance from `p` to the segment `a`-`b` (projection clamped to [0, 1])
fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > 0.0 {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    p.distance(a + ab * t)
}
