//! Live entity storage
//!
//! Three vectors kept in insertion order. Iteration order is part of the
//! gameplay contract: towers target the first enemy in range, and enemies are
//! stored in spawn order.

use glam::Vec2;

use super::entities::{
    Enemy, EnemyCategory, EnemyId, Projectile, ProjectileId, Tower, TowerId, TowerKind,
};
use crate::config::GameConfig;

/// Every live enemy, tower and projectile
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    pub enemies: Vec<Enemy>,
    pub towers: Vec<Tower>,
    pub projectiles: Vec<Projectile>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn spawn_enemy(
        &mut self,
        config: &GameConfig,
        category: EnemyCategory,
        wave: u32,
        start: Vec2,
    ) -> EnemyId {
        let id = EnemyId(self.alloc_id());
        let spec = config.enemies.get(category);
        self.enemies.push(Enemy::new(id, category, spec, wave, start));
        id
    }

    pub fn add_tower(&mut self, config: &GameConfig, kind: TowerKind, pos: Vec2) -> TowerId {
        let id = TowerId(self.alloc_id());
        self.towers.push(Tower::new(id, kind, config.towers.get(kind), pos));
        id
    }

    /// Register a projectile, assigning its id
    pub fn add_projectile(&mut self, mut projectile: Projectile) -> ProjectileId {
        let id = ProjectileId(self.alloc_id());
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.iter().find(|t| t.id == id)
    }

    pub fn tower_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.towers.iter_mut().find(|t| t.id == id)
    }

    pub fn remove_enemy(&mut self, id: EnemyId) -> Option<Enemy> {
        let index = self.enemies.iter().position(|e| e.id == id)?;
        Some(self.enemies.remove(index))
    }

    pub fn remove_tower(&mut self, id: TowerId) -> Option<Tower> {
        let index = self.towers.iter().position(|t| t.id == id)?;
        Some(self.towers.remove(index))
    }

    /// Topmost tower whose footprint contains `point`
    pub fn tower_at(&self, point: Vec2, half_size: f32) -> Option<TowerId> {
        self.towers
            .iter()
            .rev()
            .find(|t| (t.pos.x - point.x).abs() <= half_size && (t.pos.y - point.y).abs() <= half_size)
            .map(|t| t.id)
    }

    pub fn live_enemies(&self) -> usize {
        self.enemies.len()
    }

    /// Drop enemies and projectiles, keep towers
    pub fn clear_combat(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
    }

    /// Drop everything; ids keep increasing
    pub fn clear(&mut self) {
        self.clear_combat();
        self.towers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let config = GameConfig::default();
        let mut registry = EntityRegistry::new();
        let t = registry.add_tower(&config, TowerKind::Basic, Vec2::ZERO);
        let e = registry.spawn_enemy(&config, EnemyCategory::Basic, 1, Vec2::ZERO);
        assert_ne!(t.0, e.0);
    }

    #[test]
    fn test_spawn_order_is_preserved_on_removal() {
        let config = GameConfig::default();
        let mut registry = EntityRegistry::new();
        let a = registry.spawn_enemy(&config, EnemyCategory::Basic, 1, Vec2::ZERO);
        let b = registry.spawn_enemy(&config, EnemyCategory::Strong, 1, Vec2::ZERO);
        let c = registry.spawn_enemy(&config, EnemyCategory::Basic, 1, Vec2::ZERO);

        assert!(registry.remove_enemy(b).is_some());
        assert!(registry.remove_enemy(b).is_none());
        let order: Vec<_> = registry.enemies.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn test_tower_hit_test() {
        let config = GameConfig::default();
        let mut registry = EntityRegistry::new();
        let id = registry.add_tower(&config, TowerKind::Cannon, Vec2::new(100.0, 100.0));
        assert_eq!(registry.tower_at(Vec2::new(115.0, 85.0), 20.0), Some(id));
        assert_eq!(registry.tower_at(Vec2::new(121.0, 100.0), 20.0), None);
    }

    #[test]
    fn test_clear_combat_keeps_towers() {
        let config = GameConfig::default();
        let mut registry = EntityRegistry::new();
        registry.add_tower(&config, TowerKind::Basic, Vec2::ZERO);
        registry.spawn_enemy(&config, EnemyCategory::Boss, 10, Vec2::ZERO);
        registry.clear_combat();
        assert_eq!(registry.live_enemies(), 0);
        assert_eq!(registry.towers.len(), 1);
        registry.clear();
        assert!(registry.towers.is_empty());
    }
}
