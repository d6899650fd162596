//! Data-driven game balance
//!
//! The defaults reproduce the shipped game. Any table can be overridden from
//! JSON; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::{EnemyCategory, MovementMode, ProjectileKind, TowerKind};

/// Stats and upgrade rules for one tower kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    pub name: String,
    /// Purchase price
    pub cost: i32,
    pub damage: i32,
    pub range: f32,
    /// Minimum time between shots
    pub fire_rate_ms: f64,
    /// Price of the first upgrade; later upgrades grow from this
    pub upgrade_cost: i32,
    pub damage_increase: i32,
    pub range_increase: f32,
    pub projectile: ProjectileKind,
    /// Projectiles per volley at level 1 (multishot only, others fire one)
    #[serde(default = "one")]
    pub base_projectiles: u32,
    /// Angle between adjacent projectiles of a volley, in degrees
    #[serde(default)]
    pub projectile_spread_deg: f32,
}

fn one() -> u32 {
    1
}

impl TowerSpec {
    /// Upgrade price when the tower is currently at `level`
    ///
    /// Each level adds `growth` times the base price, floored.
    pub fn upgrade_cost_at(&self, level: u32, growth: f64) -> i32 {
        let base = f64::from(self.upgrade_cost);
        let steps = f64::from(level.saturating_sub(1));
        (base + steps * base * growth).floor() as i32
    }
}

/// Tower table keyed by [`TowerKind`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    pub basic: TowerSpec,
    pub rapid: TowerSpec,
    pub cannon: TowerSpec,
    pub multishot: TowerSpec,
}

impl TowerTable {
    pub fn get(&self, kind: TowerKind) -> &TowerSpec {
        match kind {
            TowerKind::Basic => &self.basic,
            TowerKind::Rapid => &self.rapid,
            TowerKind::Cannon => &self.cannon,
            TowerKind::Multishot => &self.multishot,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (TowerKind, &TowerSpec)> {
        TowerKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

impl Default for TowerTable {
    fn default() -> Self {
        Self {
            basic: TowerSpec {
                name: "Basic Tower".into(),
                cost: 20,
                damage: 20,
                range: 80.0,
                fire_rate_ms: 1000.0,
                upgrade_cost: 30,
                damage_increase: 10,
                range_increase: 10.0,
                projectile: ProjectileKind::Bullet,
                base_projectiles: 1,
                projectile_spread_deg: 0.0,
            },
            rapid: TowerSpec {
                name: "Rapid Fire".into(),
                cost: 40,
                damage: 10,
                range: 60.0,
                fire_rate_ms: 300.0,
                upgrade_cost: 30,
                damage_increase: 10,
                range_increase: 10.0,
                projectile: ProjectileKind::Bullet,
                base_projectiles: 1,
                projectile_spread_deg: 0.0,
            },
            cannon: TowerSpec {
                name: "Cannon".into(),
                cost: 60,
                damage: 50,
                range: 100.0,
                fire_rate_ms: 1500.0,
                upgrade_cost: 30,
                damage_increase: 10,
                range_increase: 10.0,
                projectile: ProjectileKind::CannonBall,
                base_projectiles: 1,
                projectile_spread_deg: 0.0,
            },
            multishot: TowerSpec {
                name: "Multishot".into(),
                cost: 100,
                damage: 15,
                range: 90.0,
                fire_rate_ms: 1200.0,
                upgrade_cost: 60,
                damage_increase: 10,
                range_increase: 10.0,
                projectile: ProjectileKind::Bullet,
                base_projectiles: 3,
                projectile_spread_deg: 30.0,
            },
        }
    }
}

/// Base stats and per-wave growth for one enemy category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub base_health: i32,
    pub health_increase: i32,
    pub base_speed: f32,
    pub speed_increase: f32,
    pub base_value: i32,
    pub value_increase: i32,
    /// Health the player loses when this enemy reaches the end of the path
    pub damage_to_player: i32,
    /// Collision radius (half the displayed width)
    pub radius: f32,
}

/// Wave-scaled enemy stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: i32,
    pub speed: f32,
    pub value: i32,
}

impl EnemySpec {
    /// Linear scaling: `base + (wave - 1) * increase` for health, speed and value
    pub fn stats_for_wave(&self, wave: u32) -> EnemyStats {
        let steps = wave.saturating_sub(1);
        EnemyStats {
            health: self.base_health + steps as i32 * self.health_increase,
            speed: self.base_speed + steps as f32 * self.speed_increase,
            value: self.base_value + steps as i32 * self.value_increase,
        }
    }
}

/// Enemy table keyed by [`EnemyCategory`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    pub basic: EnemySpec,
    pub strong: EnemySpec,
    pub boss: EnemySpec,
    pub super_boss: EnemySpec,
}

impl EnemyTable {
    pub fn get(&self, category: EnemyCategory) -> &EnemySpec {
        match category {
            EnemyCategory::Basic => &self.basic,
            EnemyCategory::Strong => &self.strong,
            EnemyCategory::Boss => &self.boss,
            EnemyCategory::SuperBoss => &self.super_boss,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            basic: EnemySpec {
                base_health: 50,
                health_increase: 20,
                base_speed: 50.0,
                speed_increase: 10.0,
                base_value: 5,
                value_increase: 1,
                damage_to_player: 5,
                radius: 16.0,
            },
            strong: EnemySpec {
                base_health: 100,
                health_increase: 30,
                base_speed: 40.0,
                speed_increase: 8.0,
                base_value: 10,
                value_increase: 3,
                damage_to_player: 10,
                radius: 16.0,
            },
            boss: EnemySpec {
                base_health: 1500,
                health_increase: 50,
                base_speed: 30.0,
                speed_increase: 5.0,
                base_value: 50,
                value_increase: 10,
                damage_to_player: 90,
                radius: 19.2,
            },
            super_boss: EnemySpec {
                base_health: 15000,
                health_increase: 500,
                base_speed: 25.0,
                speed_increase: 3.0,
                base_value: 200,
                value_increase: 50,
                damage_to_player: 100,
                radius: 24.0,
            },
        }
    }
}

/// Wave sizing, cadence and rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSpec {
    pub base_enemies: u32,
    pub enemies_increase: u32,
    /// Money credited when a wave is cleared
    pub wave_bonus: i32,
    pub strong_enemy_chance: f64,
    /// Strong enemies may appear on waves strictly after this one
    pub strong_enemy_start_wave: u32,
    pub boss_wave: u32,
    pub super_boss_wave: u32,
    pub spawn_interval_ms: f64,
    /// Delay before the next wave starts when auto-start is on
    pub auto_start_delay_ms: f64,
}

impl WaveSpec {
    /// Enemies planned for `wave`; the boss wave holds only the boss
    pub fn enemies_planned(&self, wave: u32) -> u32 {
        if wave == self.boss_wave {
            1
        } else {
            self.base_enemies + wave.saturating_sub(1) * self.enemies_increase
        }
    }
}

impl Default for WaveSpec {
    fn default() -> Self {
        Self {
            base_enemies: 7,
            enemies_increase: 2,
            wave_bonus: 50,
            strong_enemy_chance: 0.3,
            strong_enemy_start_wave: 3,
            boss_wave: 10,
            super_boss_wave: 30,
            spawn_interval_ms: 1000.0,
            auto_start_delay_ms: 3000.0,
        }
    }
}

/// Player economy, projectile and placement rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSpec {
    pub starting_health: i32,
    pub starting_money: i32,
    pub starting_wave: u32,
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    pub cannon_ball_radius: f32,
    /// Minimum distance between two tower centres
    pub tower_placement_radius: f32,
    /// Minimum distance between a tower centre and the path
    pub path_clearance: f32,
    /// Distance at which an enemy counts as having reached a waypoint
    pub waypoint_snap_distance: f32,
    /// Fraction of total spend refunded on sale
    pub sell_ratio: f64,
    /// Upgrade price growth per level, as a fraction of the base upgrade price
    pub upgrade_cost_growth: f64,
    pub movement_mode: MovementMode,
}

impl Default for GameSpec {
    fn default() -> Self {
        Self {
            starting_health: 100,
            starting_money: 300,
            starting_wave: 1,
            bullet_speed: 300.0,
            bullet_radius: 4.0,
            cannon_ball_radius: 6.0,
            tower_placement_radius: 30.0,
            path_clearance: 40.0,
            waypoint_snap_distance: 5.0,
            sell_ratio: 0.7,
            upgrade_cost_growth: 0.5,
            movement_mode: MovementMode::Waypoint,
        }
    }
}

/// Complete balance configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub towers: TowerTable,
    pub enemies: EnemyTable,
    pub waves: WaveSpec,
    pub game: GameSpec,
}

impl GameConfig {
    /// Parse and validate a JSON balance file
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tables that would stall or break the simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, spec) in self.towers.iter() {
            if !(spec.fire_rate_ms > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{kind:?} tower fire rate must be positive"
                )));
            }
            if !(spec.range > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{kind:?} tower range must be positive"
                )));
            }
            if spec.cost < 0 || spec.upgrade_cost < 0 {
                return Err(ConfigError::Invalid(format!(
                    "{kind:?} tower prices must not be negative"
                )));
            }
            if spec.base_projectiles == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{kind:?} tower must fire at least one projectile"
                )));
            }
        }
        for category in EnemyCategory::ALL {
            let spec = self.enemies.get(category);
            if !(spec.base_speed > 0.0) || spec.base_health <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "{category:?} enemy needs positive health and speed"
                )));
            }
        }
        if self.waves.boss_wave == 0 || self.waves.super_boss_wave == 0 {
            return Err(ConfigError::Invalid("boss waves start at 1".into()));
        }
        if !(self.waves.spawn_interval_ms > 0.0) {
            return Err(ConfigError::Invalid("spawn interval must be positive".into()));
        }
        if self.game.starting_wave == 0 {
            return Err(ConfigError::Invalid("starting wave must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.game.sell_ratio) {
            return Err(ConfigError::Invalid("sell ratio must be within 0..=1".into()));
        }
        if !(self.game.bullet_speed > 0.0) {
            return Err(ConfigError::Invalid("bullet speed must be positive".into()));
        }
        Ok(())
    }
}
