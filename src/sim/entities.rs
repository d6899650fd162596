//! Enemies, towers and projectiles
//!
//! Plain data plus the per-entity rules (movement, cooldowns, upgrade and
//! sell prices). Anything that touches more than one entity or the economy
//! lives in `combat` and `tick`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::{EffectKind, SoundKind};
use super::path::PathModel;
use crate::config::{EnemySpec, GameSpec, TowerSpec};

/// Unique identifier of an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

/// Unique identifier of a tower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(pub u32);

/// Unique identifier of a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyCategory {
    Basic,
    Strong,
    Boss,
    SuperBoss,
}

impl EnemyCategory {
    pub const ALL: [EnemyCategory; 4] = [
        EnemyCategory::Basic,
        EnemyCategory::Strong,
        EnemyCategory::Boss,
        EnemyCategory::SuperBoss,
    ];

    pub fn is_boss(self) -> bool {
        matches!(self, EnemyCategory::Boss | EnemyCategory::SuperBoss)
    }

    /// Effect requested when an enemy of this category dies
    pub fn death_effect(self) -> EffectKind {
        match self {
            EnemyCategory::Basic | EnemyCategory::Strong => EffectKind::Death,
            EnemyCategory::Boss => EffectKind::BossDeath,
            EnemyCategory::SuperBoss => EffectKind::SuperBossDeath,
        }
    }
}

/// How enemies follow the route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Steer toward the next waypoint, snapping to it once close enough
    Waypoint,
    /// Slide along the route by distance travelled
    Smooth,
}

/// Outcome of moving an enemy for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyStep {
    Moving,
    ReachedEnd,
}

/// An enemy walking the route
#[derive(Debug, Clone, Serialize)]
pub struct Enemy {
    pub id: EnemyId,
    pub category: EnemyCategory,
    pub pos: Vec2,
    /// Index of the waypoint most recently reached
    pub path_index: usize,
    /// Distance travelled along the route (smooth movement only)
    pub distance: f32,
    pub health: i32,
    pub max_health: i32,
    /// Units per second
    pub speed: f32,
    /// Money credited on kill
    pub value: i32,
    pub damage_to_player: i32,
    /// Collision radius
    pub radius: f32,
    /// Heading in radians
    pub rotation: f32,
}

impl Enemy {
    /// Spawn at the start of the route with stats scaled to `wave`
    pub fn new(id: EnemyId, category: EnemyCategory, spec: &EnemySpec, wave: u32, start: Vec2) -> Self {
        let stats = spec.stats_for_wave(wave);
        Self {
            id,
            category,
            pos: start,
            path_index: 0,
            distance: 0.0,
            health: stats.health,
            max_health: stats.health,
            speed: stats.speed,
            value: stats.value,
            damage_to_player: spec.damage_to_player,
            radius: spec.radius,
            rotation: 0.0,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.category.is_boss()
    }

    /// Move for `dt_ms` milliseconds
    ///
    /// Waypoint mode moves in a straight line toward the next waypoint,
    /// stopping on it rather than overshooting, and once within
    /// `snap_distance` of it advances `path_index` instead of moving that
    /// tick. Reaching the final waypoint index ends the walk.
    pub fn advance(
        &mut self,
        dt_ms: f32,
        path: &PathModel,
        snap_distance: f32,
        mode: MovementMode,
    ) -> EnemyStep {
        let step = self.speed * dt_ms / 1000.0;
        match mode {
            MovementMode::Waypoint => {
                if self.path_index + 1 >= path.waypoints().len() {
                    return EnemyStep::ReachedEnd;
                }
                let target = path.waypoints()[self.path_index + 1];
                let remaining = self.pos.distance(target);
                if remaining < snap_distance {
                    self.path_index += 1;
                } else {
                    let dir = (target - self.pos).normalize_or_zero();
                    self.rotation = dir.y.atan2(dir.x);
                    self.pos += dir * step.min(remaining);
                }
                EnemyStep::Moving
            }
            MovementMode::Smooth => {
                self.distance += step;
                if self.distance >= path.total_length() {
                    self.path_index = path.waypoints().len() - 1;
                    self.pos = path.end();
                    return EnemyStep::ReachedEnd;
                }
                let point = path.point_at_distance(self.distance);
                self.pos = point.position;
                self.rotation = point.angle;
                self.path_index = point.segment;
                EnemyStep::Moving
            }
        }
    }

    /// Subtract `amount` from health; true once health is `<= 0`
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health -= amount;
        self.health <= 0
    }
}

/// Projectile types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Bullet,
    CannonBall,
}

/// Tower types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    Basic,
    Rapid,
    Cannon,
    Multishot,
}

impl TowerKind {
    pub const ALL: [TowerKind; 4] = [
        TowerKind::Basic,
        TowerKind::Rapid,
        TowerKind::Cannon,
        TowerKind::Multishot,
    ];

    /// Only rapid and cannon towers turn to face their target
    pub fn rotates(self) -> bool {
        matches!(self, TowerKind::Rapid | TowerKind::Cannon)
    }

    pub fn sound(self) -> SoundKind {
        match self {
            TowerKind::Cannon => SoundKind::Cannon,
            _ => SoundKind::Shot,
        }
    }
}

/// A placed tower
#[derive(Debug, Clone, Serialize)]
pub struct Tower {
    pub id: TowerId,
    pub kind: TowerKind,
    pub pos: Vec2,
    pub damage: i32,
    pub range: f32,
    pub fire_rate_ms: f64,
    pub level: u32,
    /// Clock time of the last shot
    pub last_fired_ms: f64,
    /// Purchase price plus every upgrade paid
    pub total_spent: i32,
    /// Volleys fired; a multishot volley counts once
    pub shots_fired: u32,
    /// Individual projectiles launched
    pub projectiles_fired: u32,
    /// Projectiles that hit an enemy
    pub shots_hit: u32,
    pub kills: u32,
    /// Facing in radians (rapid and cannon only)
    pub rotation: f32,
}

impl Tower {
    pub fn new(id: TowerId, kind: TowerKind, spec: &TowerSpec, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            damage: spec.damage,
            range: spec.range,
            fire_rate_ms: spec.fire_rate_ms,
            level: 1,
            last_fired_ms: 0.0,
            total_spent: spec.cost,
            shots_fired: 0,
            projectiles_fired: 0,
            shots_hit: 0,
            kills: 0,
            rotation: 0.0,
        }
    }

    pub fn can_shoot(&self, now_ms: f64) -> bool {
        now_ms - self.last_fired_ms >= self.fire_rate_ms
    }

    pub fn in_range(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.range
    }

    /// Price of the next upgrade
    pub fn upgrade_cost(&self, spec: &TowerSpec, game: &GameSpec) -> i32 {
        spec.upgrade_cost_at(self.level, game.upgrade_cost_growth)
    }

    /// Raise the level and stats after `cost` has been paid
    pub fn apply_upgrade(&mut self, spec: &TowerSpec, cost: i32) {
        self.level += 1;
        self.damage += spec.damage_increase;
        self.range += spec.range_increase;
        self.total_spent += cost;
    }

    /// Refund on sale: `floor(total_spent * ratio)`
    pub fn sell_value(&self, ratio: f64) -> i32 {
        (f64::from(self.total_spent) * ratio).floor() as i32
    }

    /// Projectiles per volley; multishot towers gain one per level
    pub fn projectiles_per_volley(&self, spec: &TowerSpec) -> u32 {
        match self.kind {
            TowerKind::Multishot => spec.base_projectiles + (self.level - 1),
            _ => 1,
        }
    }

    /// Fraction of launched projectiles that hit, `None` before the first shot
    pub fn accuracy(&self) -> Option<f32> {
        (self.projectiles_fired > 0)
            .then(|| self.shots_hit as f32 / self.projectiles_fired as f32)
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub id: ProjectileId,
    pub kind: ProjectileKind,
    pub origin: Vec2,
    pub pos: Vec2,
    /// Unit vector, fixed at launch
    pub direction: Vec2,
    /// Units per second
    pub speed: f32,
    /// Distance from origin after which the projectile expires
    pub max_range: f32,
    pub damage: i32,
    /// Tower credited with hits and kills; may have been sold since
    pub tower: TowerId,
    pub radius: f32,
}

impl Projectile {
    /// Move for `dt_ms` milliseconds; false once past `max_range`
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.pos += self.direction * self.speed * dt_ms / 1000.0;
        self.traveled() <= self.max_range
    }

    pub fn traveled(&self) -> f32 {
        self.origin.distance(self.pos)
    }

    /// Circle overlap against an enemy
    pub fn hits(&self, enemy: &Enemy) -> bool {
        self.pos.distance(enemy.pos) < self.radius + enemy.radius
    }
}
