//! Targeting, firing and projectile hits
//!
//! Targeting is deliberately simple: a tower picks the first enemy in range,
//! walking enemies in spawn order. Hits are circle overlaps between the
//! projectile and the enemy.

use glam::Vec2;

use super::economy::EconomyState;
use super::entities::{Enemy, EnemyId, Projectile, ProjectileId, ProjectileKind, Tower};
use super::events::{EffectKind, EventBus};
use super::registry::EntityRegistry;
use crate::config::{GameConfig, GameSpec, TowerSpec};
use crate::{angle_between, direction_from_angle};

/// First enemy within the tower's range, in spawn order
pub fn find_target<'a>(tower: &Tower, enemies: &'a [Enemy]) -> Option<&'a Enemy> {
    enemies.iter().find(|e| tower.in_range(e.pos))
}

/// Turn rotating towers toward their target; others keep their facing
pub fn update_rotation(tower: &mut Tower, enemies: &[Enemy]) {
    if !tower.kind.rotates() {
        return;
    }
    if let Some(target) = find_target(tower, enemies) {
        tower.rotation = angle_between(tower.pos, target.pos);
    }
}

/// Firing angles of one volley, centred on `base`
///
/// Adjacent angles are `spread` apart; a single projectile flies at `base`.
pub fn volley_angles(base: f32, count: u32, spread: f32) -> Vec<f32> {
    let centre = (count.saturating_sub(1)) as f32 / 2.0;
    (0..count)
        .map(|i| base + (i as f32 - centre) * spread)
        .collect()
}

/// Fire at the first enemy in range if the cooldown allows
///
/// Returns `None` when the tower is cooling down or nothing is in range.
/// A volley counts as a single shot however many projectiles it holds;
/// `projectiles_fired` counts each of them.
/// Projectile ids are assigned when the registry takes them.
pub fn shoot(
    tower: &mut Tower,
    spec: &TowerSpec,
    game: &GameSpec,
    enemies: &[Enemy],
    now_ms: f64,
    events: &mut EventBus,
) -> Option<Vec<Projectile>> {
    if !tower.can_shoot(now_ms) {
        return None;
    }
    let target = find_target(tower, enemies)?;
    let base = angle_between(tower.pos, target.pos);

    let count = tower.projectiles_per_volley(spec);
    let spread = spec.projectile_spread_deg.to_radians();
    let radius = match spec.projectile {
        ProjectileKind::Bullet => game.bullet_radius,
        ProjectileKind::CannonBall => game.cannon_ball_radius,
    };

    let volley: Vec<Projectile> = volley_angles(base, count, spread)
        .into_iter()
        .map(|angle| Projectile {
            id: ProjectileId(0),
            kind: spec.projectile,
            origin: tower.pos,
            pos: tower.pos,
            direction: (point_along(tower.pos, angle, tower.range) - tower.pos).normalize_or_zero(),
            speed: game.bullet_speed,
            max_range: tower.range,
            damage: tower.damage,
            tower: tower.id,
            radius,
        })
        .collect();

    tower.last_fired_ms = now_ms;
    tower.shots_fired += 1;
    tower.projectiles_fired += volley.len() as u32;
    events.effect_at(EffectKind::MuzzleFlash, tower.pos);
    events.sound(tower.kind.sound());
    Some(volley)
}

/// Rotate, then fire, every tower in placement order
///
/// Returns the number of projectiles launched.
pub fn fire_towers(
    registry: &mut EntityRegistry,
    config: &GameConfig,
    now_ms: f64,
    events: &mut EventBus,
) -> usize {
    let mut launched = Vec::new();
    for tower in &mut registry.towers {
        update_rotation(tower, &registry.enemies);
        let spec = config.towers.get(tower.kind);
        if let Some(volley) = shoot(tower, spec, &config.game, &registry.enemies, now_ms, events) {
            launched.extend(volley);
        }
    }
    let count = launched.len();
    for projectile in launched {
        registry.add_projectile(projectile);
    }
    count
}

/// Apply damage to a live enemy, paying out and removing it on a kill
///
/// Returns true when the enemy died. Unknown ids are ignored.
pub fn damage_enemy(
    registry: &mut EntityRegistry,
    economy: &mut EconomyState,
    events: &mut EventBus,
    id: EnemyId,
    amount: i32,
) -> bool {
    let Some(enemy) = registry.enemies.iter_mut().find(|e| e.id == id) else {
        return false;
    };
    if !enemy.take_damage(amount) {
        return false;
    }
    if let Some(enemy) = registry.remove_enemy(id) {
        defeat(&enemy, economy, events);
    }
    true
}

fn defeat(enemy: &Enemy, economy: &mut EconomyState, events: &mut EventBus) {
    economy.add_money(enemy.value, events);
    economy.record_enemy_defeated();
    events.effect_with_amount(enemy.category.death_effect(), enemy.pos, enemy.value);
    if enemy.is_boss() {
        log::info!("{:?} defeated (+{})", enemy.category, enemy.value);
    }
}

/// Move every projectile, expire those past range and resolve hits
///
/// A projectile hits the first overlapping enemy in spawn order and is
/// consumed. Hits and kills are credited to the firing tower if it still
/// stands. Returns the number of enemies killed.
pub fn resolve_projectiles(
    registry: &mut EntityRegistry,
    economy: &mut EconomyState,
    events: &mut EventBus,
    dt_ms: f32,
) -> u32 {
    let mut kills = 0;
    let mut i = 0;
    while i < registry.projectiles.len() {
        if !registry.projectiles[i].advance(dt_ms) {
            registry.projectiles.remove(i);
            continue;
        }

        let projectile = &registry.projectiles[i];
        let Some(target) = registry
            .enemies
            .iter()
            .find(|e| projectile.hits(e))
            .map(|e| e.id)
        else {
            i += 1;
            continue;
        };

        let projectile = registry.projectiles.remove(i);
        let killed = damage_enemy(registry, economy, events, target, projectile.damage);
        if let Some(tower) = registry.tower_mut(projectile.tower) {
            tower.shots_hit += 1;
            if killed {
                tower.kills += 1;
            }
        }
        if killed {
            kills += 1;
        }
    }
    kills
}

/// Aim point `distance` units from `origin` along `angle`
pub fn point_along(origin: Vec2, angle: f32, distance: f32) -> Vec2 {
    origin + direction_from_angle(angle) * distance
}
