//! Simulation clock and player actions
//!
//! [`Simulation`] owns every piece of game state and advances it one frame at
//! a time. The per-tick order is fixed:
//! 1. Release enemies due from the wave timer
//! 2. Move enemies; those reaching the end damage the player and leave
//! 3. Rotate and fire towers
//! 4. Move projectiles and resolve hits
//! 5. Close the wave if it is complete
//! 6. Enter game over if health has run out
//!
//! Player actions return [`ActionError`] instead of silently failing. After
//! game over every action except [`Simulation::restart`] is rejected.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::combat;
use super::economy::{EconomyState, EconomyStats};
use super::entities::{
    Enemy, EnemyCategory, EnemyStep, Projectile, Tower, TowerId, TowerKind,
};
use super::events::{EffectKind, EventBus, GameEvent, SubscriptionId};
use super::path::PathModel;
use super::placement::PlacementValidator;
use super::registry::EntityRegistry;
use super::wave::{WaveController, WaveInfo};
use crate::config::GameConfig;
use crate::consts::*;
use crate::error::{ActionError, ConfigError};
use crate::maps;
use crate::settings::Settings;

/// Serializable view of the simulation after a tick
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub now_ms: f64,
    pub paused: bool,
    pub speed: u32,
    pub victory: bool,
    pub economy: EconomyStats,
    pub wave: WaveInfo,
    pub selected: Option<TowerId>,
    pub enemies: Vec<Enemy>,
    pub towers: Vec<Tower>,
    pub projectiles: Vec<Projectile>,
}

/// Complete game: state, clock and player actions
#[derive(Debug)]
pub struct Simulation {
    config: GameConfig,
    path: PathModel,
    placement: PlacementValidator,
    economy: EconomyState,
    registry: EntityRegistry,
    waves: WaveController,
    events: EventBus,
    seed: u64,
    rng: Pcg32,
    selected: Option<TowerId>,
    speed: u32,
    paused: bool,
    auto_start: bool,
    victory: bool,
    /// Scaled simulation time since start or restart
    now_ms: f64,
}

impl Simulation {
    /// New game on `path`; the config is validated first
    pub fn new(config: GameConfig, path: PathModel, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let placement = PlacementValidator::new(&config.game);
        let economy = EconomyState::new(&config.game);
        let waves = WaveController::new(&config.waves, config.game.starting_wave);
        Ok(Self {
            config,
            path,
            placement,
            economy,
            registry: EntityRegistry::new(),
            waves,
            events: EventBus::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            selected: None,
            speed: MIN_SPEED,
            paused: false,
            auto_start: false,
            victory: false,
            now_ms: 0.0,
        })
    }

    /// New game on a built-in map
    pub fn with_map(config: GameConfig, map_id: &str, seed: u64) -> Result<Self, ConfigError> {
        let path = maps::by_id(map_id)?.path()?;
        Self::new(config, path, seed)
    }

    /// Apply stored preferences (sound, auto-start, speed)
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.events.set_sound_enabled(settings.sound_enabled);
        self.set_auto_start(settings.auto_start_waves);
        self.set_speed(settings.effective_speed());
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn path(&self) -> &PathModel {
        &self.path
    }

    pub fn economy(&self) -> &EconomyState {
        &self.economy
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn waves(&self) -> &WaveController {
        &self.waves
    }

    /// Direct access to the bus, e.g. to unsubscribe or re-enable buffering
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Deliver events to `listener` as they are emitted
    ///
    /// Also turns buffering off, so a host that only listens never grows the
    /// drain queue. Call `events_mut().set_buffering(true)` to do both.
    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.events.set_buffering(false);
        self.events.subscribe(listener)
    }

    /// Events emitted since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.economy.is_game_over()
    }

    /// The super-boss wave has been cleared at least once
    pub fn is_victory(&self) -> bool {
        self.victory
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn set_auto_start(&mut self, enabled: bool) {
        self.auto_start = enabled;
        if !enabled {
            self.waves.cancel_auto_start();
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            now_ms: self.now_ms,
            paused: self.paused,
            speed: self.speed,
            victory: self.victory,
            economy: self.economy.stats(),
            wave: self.waves.info(),
            selected: self.selected,
            enemies: self.registry.enemies.clone(),
            towers: self.registry.towers.clone(),
            projectiles: self.registry.projectiles.clone(),
        }
    }

    /// Advance by one frame of `frame_ms` real milliseconds
    ///
    /// The frame is capped at `MAX_FRAME_MS`, scaled by the game speed and
    /// run as equal steps no longer than `SIM_STEP_MS`, so one frame at 9x
    /// plays out exactly like nine frames at 1x. Nothing happens while
    /// paused or after game over.
    pub fn tick(&mut self, frame_ms: f32) {
        if self.paused || self.economy.is_game_over() {
            return;
        }
        let scaled = frame_ms.clamp(0.0, MAX_FRAME_MS) * self.speed as f32;
        let (steps, dt) = substeps(scaled);
        for _ in 0..steps {
            if self.economy.is_game_over() {
                break;
            }
            self.step(dt);
        }
    }

    fn step(&mut self, dt: f32) {
        self.now_ms += f64::from(dt);

        if self.waves.tick_auto_start(f64::from(dt)) {
            // Only fails if a wave is already running
            let _ = self.begin_wave();
        }

        for category in self.waves.update(f64::from(dt), &mut self.rng) {
            self.spawn(category);
        }

        self.move_enemies(dt);
        combat::fire_towers(&mut self.registry, &self.config, self.now_ms, &mut self.events);
        combat::resolve_projectiles(&mut self.registry, &mut self.economy, &mut self.events, dt);

        if self.waves.check_completion(self.registry.live_enemies()) {
            self.finish_wave();
        }

        if self.economy.is_defeated() {
            self.game_over();
        }
    }

    fn spawn(&mut self, category: EnemyCategory) {
        let wave = self.waves.wave();
        let start = self.path.start();
        self.registry.spawn_enemy(&self.config, category, wave, start);
        match category {
            EnemyCategory::Boss => {
                log::info!("Boss spawned on wave {wave}");
                self.events.effect_at(EffectKind::BossSpawn, start);
            }
            EnemyCategory::SuperBoss => {
                log::info!("Super boss spawned on wave {wave}");
                self.events.effect_at(EffectKind::SuperBossSpawn, start);
            }
            _ => {}
        }
    }

    fn move_enemies(&mut self, dt: f32) {
        let snap = self.config.game.waypoint_snap_distance;
        let mode = self.config.game.movement_mode;
        let path = &self.path;
        let economy = &mut self.economy;
        self.registry.enemies.retain_mut(|enemy| {
            match enemy.advance(dt, path, snap, mode) {
                EnemyStep::Moving => true,
                EnemyStep::ReachedEnd => {
                    economy.take_damage(enemy.damage_to_player);
                    false
                }
            }
        });
    }

    fn finish_wave(&mut self) {
        let finished = self.waves.end_wave();
        let bonus = self.config.waves.wave_bonus;
        self.economy.add_money(bonus, &mut self.events);
        log::info!("Wave {finished} complete (+{bonus})");

        if finished == self.config.waves.super_boss_wave {
            self.victory = true;
            log::info!("Victory on wave {finished}");
            self.events.screen_effect(EffectKind::Victory);
        }
        if self.auto_start && !self.economy.is_defeated() {
            self.waves.schedule_auto_start();
        }
    }

    fn game_over(&mut self) {
        if !self.economy.mark_game_over() {
            return;
        }
        self.registry.clear_combat();
        self.waves.cancel_auto_start();
        log::info!(
            "Game over on wave {} ({} enemies defeated)",
            self.waves.wave(),
            self.economy.enemies_defeated()
        );
        self.events.screen_effect(EffectKind::GameOver);
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        if self.economy.is_game_over() {
            Err(ActionError::GameOver)
        } else {
            Ok(())
        }
    }

    /// Start the next wave
    pub fn start_wave(&mut self) -> Result<u32, ActionError> {
        self.ensure_playing()?;
        self.begin_wave()
    }

    fn begin_wave(&mut self) -> Result<u32, ActionError> {
        let wave = self.waves.start_wave()?;
        log::info!("Wave {wave} started ({} enemies)", self.waves.info().planned);
        self.events.screen_effect(EffectKind::WaveStart(wave));
        Ok(wave)
    }

    /// Buy and place a tower at `point`
    pub fn place_tower(&mut self, kind: TowerKind, point: Vec2) -> Result<TowerId, ActionError> {
        self.ensure_playing()?;
        let cost = self.config.towers.get(kind).cost;
        if !self.economy.can_afford(cost) {
            log::debug!("Cannot afford {kind:?} tower ({cost})");
            return Err(ActionError::InsufficientFunds {
                needed: cost,
                available: self.economy.money(),
            });
        }
        if let Err(err) = self.placement.check(point, &self.path, &self.registry.towers) {
            log::debug!("Rejected {kind:?} tower at {point}: {err}");
            return Err(err.into());
        }

        self.economy.spend_money(cost, &mut self.events)?;
        self.economy.record_tower_built();
        let id = self.registry.add_tower(&self.config, kind, point);
        self.events.effect_at(EffectKind::Placement, point);
        log::debug!("Placed {kind:?} tower {} at {point}", id.0);
        Ok(id)
    }

    /// Whether a tower could be placed at `point`, ignoring cost
    pub fn can_place_tower(&self, point: Vec2) -> bool {
        self.placement
            .can_place_tower(point, &self.path, &self.registry.towers)
    }

    /// Tower whose footprint contains `point`
    pub fn tower_at(&self, point: Vec2) -> Option<TowerId> {
        self.registry.tower_at(point, TOWER_HALF_SIZE)
    }

    pub fn selected_tower(&self) -> Option<&Tower> {
        self.selected.and_then(|id| self.registry.tower(id))
    }

    pub fn select_tower(&mut self, id: TowerId) -> Result<(), ActionError> {
        self.ensure_playing()?;
        if self.registry.tower(id).is_none() {
            return Err(ActionError::UnknownTower);
        }
        self.selected = Some(id);
        self.events.emit(GameEvent::TowerSelected { tower: id });
        Ok(())
    }

    pub fn deselect_tower(&mut self) {
        if self.selected.take().is_some() {
            self.events.emit(GameEvent::TowerDeselected);
        }
    }

    /// Select the tower under `point`, or clear the selection if there is none
    pub fn click(&mut self, point: Vec2) -> Result<Option<TowerId>, ActionError> {
        match self.tower_at(point) {
            Some(id) => self.select_tower(id).map(|()| Some(id)),
            None => {
                self.deselect_tower();
                Ok(None)
            }
        }
    }

    /// Price of upgrading the selected tower
    pub fn selected_upgrade_cost(&self) -> Option<i32> {
        let tower = self.selected_tower()?;
        Some(tower.upgrade_cost(self.config.towers.get(tower.kind), &self.config.game))
    }

    /// Upgrade the selected tower; returns its new level
    pub fn upgrade_selected(&mut self) -> Result<u32, ActionError> {
        self.ensure_playing()?;
        let id = self.selected.ok_or(ActionError::NoTowerSelected)?;
        self.upgrade_tower(id)
    }

    pub fn upgrade_tower(&mut self, id: TowerId) -> Result<u32, ActionError> {
        self.ensure_playing()?;
        let tower = self.registry.tower(id).ok_or(ActionError::UnknownTower)?;
        let spec = self.config.towers.get(tower.kind);
        let cost = tower.upgrade_cost(spec, &self.config.game);

        self.economy.spend_money(cost, &mut self.events)?;
        let tower = self
            .registry
            .tower_mut(id)
            .ok_or(ActionError::UnknownTower)?;
        tower.apply_upgrade(spec, cost);
        let (level, pos) = (tower.level, tower.pos);
        self.events.effect_at(EffectKind::Upgrade, pos);
        log::debug!("Upgraded tower {} to level {level} ({cost})", id.0);
        Ok(level)
    }

    /// Sell the selected tower; returns the refund
    pub fn sell_selected(&mut self) -> Result<i32, ActionError> {
        self.ensure_playing()?;
        let id = self.selected.ok_or(ActionError::NoTowerSelected)?;
        self.sell_tower(id)
    }

    pub fn sell_tower(&mut self, id: TowerId) -> Result<i32, ActionError> {
        self.ensure_playing()?;
        let tower = self.registry.remove_tower(id).ok_or(ActionError::UnknownTower)?;
        let refund = tower.sell_value(self.config.game.sell_ratio);
        self.economy.add_money(refund, &mut self.events);
        if self.selected == Some(id) {
            self.deselect_tower();
        }
        log::debug!("Sold tower {} for {refund}", id.0);
        Ok(refund)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Returns the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Set the game speed multiplier, clamped to `MIN_SPEED..=MAX_SPEED`
    pub fn set_speed(&mut self, speed: u32) -> u32 {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.speed
    }

    /// Fresh game on the same map, config and seed; settings are kept
    pub fn restart(&mut self) {
        let before = self.economy.money();
        self.deselect_tower();
        self.economy.reset();
        self.waves.reset();
        self.registry.clear();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.paused = false;
        self.victory = false;
        self.now_ms = 0.0;
        let money = self.economy.money();
        self.events.money_changed(money, money - before);
        log::info!("Game restarted");
    }
}

/// Split a scaled frame into `(count, length)` steps of at most `SIM_STEP_MS`
///
/// Frames that are a whole number of steps (within float noise) use exactly
/// `SIM_STEP_MS`, keeping runs at different speeds bit-identical.
fn substeps(scaled_ms: f32) -> (u32, f32) {
    let ratio = scaled_ms / SIM_STEP_MS;
    let whole = ratio.round();
    if whole >= 1.0 && (ratio - whole).abs() < 1e-3 {
        return ((whole as u32).min(MAX_SUBSTEPS), SIM_STEP_MS);
    }
    let count = (ratio.ceil() as u32).clamp(1, MAX_SUBSTEPS);
    (count, scaled_ms / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSpec;
    use proptest::prelude::*;

    /// Straight route along y = 100
    fn line_path(length: f32) -> PathModel {
        PathModel::new(vec![Vec2::new(0.0, 100.0), Vec2::new(length, 100.0)]).unwrap()
    }

    fn sim_with(config: GameConfig) -> Simulation {
        Simulation::new(config, line_path(400.0), 7).unwrap()
    }

    fn sim() -> Simulation {
        sim_with(GameConfig::default())
    }

    fn run_for(sim: &mut Simulation, ms: f32) {
        let frames = (ms / FRAME_MS).round() as usize;
        for _ in 0..frames {
            sim.tick(FRAME_MS);
        }
    }

    fn effects(events: &[GameEvent]) -> Vec<EffectKind> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::VisualEffect { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_placement_clearance_scenario() {
        let mut sim = sim();
        // 50 units from the path is fine, 20 is not
        assert!(sim.place_tower(TowerKind::Basic, Vec2::new(100.0, 150.0)).is_ok());
        assert_eq!(
            sim.place_tower(TowerKind::Basic, Vec2::new(200.0, 120.0)),
            Err(ActionError::InvalidPlacement(
                crate::error::PlacementError::TooCloseToPath
            ))
        );
        assert_eq!(
            sim.place_tower(TowerKind::Basic, Vec2::new(110.0, 150.0)),
            Err(ActionError::InvalidPlacement(
                crate::error::PlacementError::TooCloseToTower
            ))
        );
        assert_eq!(sim.economy().money(), 280);
        assert_eq!(sim.economy().towers_built(), 1);
    }

    #[test]
    fn test_non_finite_placement_is_rejected() {
        let mut sim = sim();
        assert_eq!(
            sim.place_tower(TowerKind::Basic, Vec2::new(f32::NAN, 150.0)),
            Err(ActionError::InvalidPlacement(
                crate::error::PlacementError::NonFinite
            ))
        );
        assert!(!sim.can_place_tower(Vec2::new(150.0, f32::INFINITY)));
        assert_eq!(sim.economy().money(), 300);
        assert!(sim.registry().towers.is_empty());
    }

    #[test]
    fn test_subscribed_listener_replaces_buffer() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut sim = sim();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sim.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        sim.place_tower(TowerKind::Basic, Vec2::new(100.0, 150.0)).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 3000.0);

        let seen = seen.borrow();
        assert!(effects(&seen).contains(&EffectKind::Placement));
        assert!(effects(&seen).contains(&EffectKind::MuzzleFlash));
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_placement_needs_money() {
        let mut config = GameConfig::default();
        config.game.starting_money = 50;
        let mut sim = sim_with(config);
        assert_eq!(
            sim.place_tower(TowerKind::Multishot, Vec2::new(100.0, 200.0)),
            Err(ActionError::InsufficientFunds {
                needed: 100,
                available: 50
            })
        );
        assert_eq!(sim.economy().money(), 50);
        assert!(sim.registry().towers.is_empty());
    }

    #[test]
    fn test_placement_emits_money_and_effect() {
        let mut sim = sim();
        let point = Vec2::new(100.0, 200.0);
        sim.place_tower(TowerKind::Cannon, point).unwrap();
        assert_eq!(
            sim.drain_events(),
            vec![
                GameEvent::MoneyChanged {
                    new_amount: 240,
                    delta: -60
                },
                GameEvent::VisualEffect {
                    kind: EffectKind::Placement,
                    position: Some(point),
                    amount: None,
                },
            ]
        );
    }

    #[test]
    fn test_selection_and_sell() {
        let mut sim = sim();
        let id = sim.place_tower(TowerKind::Rapid, Vec2::new(100.0, 200.0)).unwrap();
        assert_eq!(sim.upgrade_selected(), Err(ActionError::NoTowerSelected));
        assert_eq!(sim.click(Vec2::new(110.0, 190.0)), Ok(Some(id)));
        assert_eq!(sim.selected_tower().map(|t| t.id), Some(id));
        sim.drain_events();

        assert_eq!(sim.sell_selected(), Ok(28));
        assert!(sim.selected_tower().is_none());
        assert!(sim.registry().tower(id).is_none());
        assert_eq!(sim.economy().money(), 300 - 40 + 28);
        assert!(sim.drain_events().contains(&GameEvent::TowerDeselected));
        assert_eq!(sim.sell_selected(), Err(ActionError::NoTowerSelected));
    }

    #[test]
    fn test_click_on_empty_ground_deselects() {
        let mut sim = sim();
        let id = sim.place_tower(TowerKind::Basic, Vec2::new(100.0, 200.0)).unwrap();
        sim.select_tower(id).unwrap();
        sim.drain_events();
        assert_eq!(sim.click(Vec2::new(300.0, 300.0)), Ok(None));
        assert_eq!(sim.drain_events(), vec![GameEvent::TowerDeselected]);
    }

    #[test]
    fn test_upgrade_selected() {
        let mut sim = sim();
        let id = sim.place_tower(TowerKind::Basic, Vec2::new(100.0, 200.0)).unwrap();
        sim.select_tower(id).unwrap();
        assert_eq!(sim.selected_upgrade_cost(), Some(30));
        assert_eq!(sim.upgrade_selected(), Ok(2));
        assert_eq!(sim.selected_upgrade_cost(), Some(45));

        let tower = sim.selected_tower().unwrap();
        assert_eq!((tower.damage, tower.range, tower.total_spent), (30, 90.0, 50));
        assert_eq!(sim.economy().money(), 250);
        assert!(effects(&sim.drain_events()).contains(&EffectKind::Upgrade));
    }

    #[test]
    fn test_upgrade_without_money_changes_nothing() {
        let mut config = GameConfig::default();
        config.game.starting_money = 40;
        let mut sim = sim_with(config);
        let id = sim.place_tower(TowerKind::Basic, Vec2::new(100.0, 200.0)).unwrap();
        sim.select_tower(id).unwrap();
        assert_eq!(
            sim.upgrade_selected(),
            Err(ActionError::InsufficientFunds {
                needed: 30,
                available: 20
            })
        );
        let tower = sim.selected_tower().unwrap();
        assert_eq!((tower.level, tower.damage, tower.total_spent), (1, 20, 20));
    }

    #[test]
    fn test_boss_wave_scenario() {
        let mut config = GameConfig::default();
        config.game.starting_wave = 10;
        let mut sim = sim_with(config);
        assert_eq!(sim.start_wave(), Ok(10));
        assert_eq!(sim.start_wave(), Err(ActionError::WaveInProgress));
        run_for(&mut sim, 3000.0);

        let info = sim.waves().info();
        assert_eq!((info.planned, info.spawned), (1, 1));
        assert_eq!(sim.registry().enemies.len(), 1);
        assert_eq!(sim.registry().enemies[0].category, EnemyCategory::Boss);
        let kinds = effects(&sim.drain_events());
        assert!(kinds.contains(&EffectKind::WaveStart(10)));
        assert!(kinds.contains(&EffectKind::BossSpawn));
    }

    #[test]
    fn test_leaked_wave_completes_with_bonus() {
        let mut config = GameConfig::default();
        config.waves.base_enemies = 1;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        sim.start_wave().unwrap();
        // 1s spawn delay, then 100 units at 50 u/s
        run_for(&mut sim, 4000.0);

        assert_eq!(sim.economy().health(), 95);
        assert_eq!(sim.economy().money(), 350);
        assert_eq!(sim.waves().wave(), 2);
        assert!(!sim.waves().is_active());
        assert_eq!(sim.waves().info().planned, 3);
    }

    #[test]
    fn test_towers_defend_a_wave() {
        let mut config = GameConfig::default();
        config.waves.base_enemies = 3;
        let mut sim = Simulation::new(config, line_path(600.0), 3).unwrap();
        for x in [100.0, 200.0, 300.0] {
            sim.place_tower(TowerKind::Cannon, Vec2::new(x, 150.0)).unwrap();
        }
        sim.start_wave().unwrap();
        run_for(&mut sim, 20_000.0);

        assert_eq!(sim.economy().enemies_defeated(), 3);
        assert_eq!(sim.economy().health(), 100);
        assert_eq!(sim.economy().money(), 300 - 180 + 3 * 5 + 50);
        let fired: u32 = sim.registry().towers.iter().map(|t| t.shots_fired).sum();
        let kills: u32 = sim.registry().towers.iter().map(|t| t.kills).sum();
        assert!(fired >= 3);
        assert_eq!(kills, 3);
    }

    #[test]
    fn test_health_at_zero_is_game_over() {
        let mut config = GameConfig::default();
        config.game.starting_health = 5;
        config.waves.base_enemies = 2;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 3500.0);

        assert_eq!(sim.economy().health(), 0);
        assert!(sim.is_game_over());
        assert!(sim.registry().enemies.is_empty());
        assert!(sim.registry().projectiles.is_empty());
        let kinds = effects(&sim.drain_events());
        assert_eq!(kinds.iter().filter(|k| **k == EffectKind::GameOver).count(), 1);

        // Frozen
        let now = sim.now_ms();
        run_for(&mut sim, 1000.0);
        assert_eq!(sim.now_ms(), now);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_overkill_damage_is_game_over() {
        let mut config = GameConfig::default();
        config.game.starting_health = 5;
        config.enemies.basic.damage_to_player = 10;
        config.waves.base_enemies = 1;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 3500.0);
        assert_eq!(sim.economy().health(), -5);
        assert!(sim.is_game_over());
    }

    #[test]
    fn test_actions_rejected_after_game_over_until_restart() {
        let mut config = GameConfig::default();
        config.game.starting_health = 5;
        config.waves.base_enemies = 1;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        let id = sim.place_tower(TowerKind::Basic, Vec2::new(380.0, 300.0)).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 3500.0);
        assert!(sim.is_game_over());

        assert_eq!(sim.start_wave(), Err(ActionError::GameOver));
        assert_eq!(
            sim.place_tower(TowerKind::Basic, Vec2::new(200.0, 300.0)),
            Err(ActionError::GameOver)
        );
        assert_eq!(sim.select_tower(id), Err(ActionError::GameOver));
        assert_eq!(sim.sell_tower(id), Err(ActionError::GameOver));
        assert_eq!(sim.upgrade_tower(id), Err(ActionError::GameOver));

        sim.restart();
        assert!(!sim.is_game_over());
        assert_eq!(sim.economy().health(), 5);
        assert_eq!(sim.economy().money(), 300);
        assert!(sim.registry().towers.is_empty());
        assert_eq!(sim.waves().wave(), 1);
        assert_eq!(sim.now_ms(), 0.0);
        assert_eq!(sim.start_wave(), Ok(1));
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut sim = sim();
        sim.start_wave().unwrap();
        run_for(&mut sim, 500.0);
        sim.pause();
        let before = serde_json::to_string(&sim.snapshot()).unwrap();
        run_for(&mut sim, 5000.0);
        assert_eq!(serde_json::to_string(&sim.snapshot()).unwrap(), before);

        assert!(!sim.toggle_pause());
        // The spawn timer kept its 500ms
        run_for(&mut sim, 520.0);
        assert_eq!(sim.waves().info().spawned, 1);
    }

    #[test]
    fn test_speed_scales_delta_time() {
        let mut fast = sim();
        assert_eq!(fast.set_speed(20), MAX_SPEED);
        assert_eq!(fast.set_speed(0), MIN_SPEED);
        fast.set_speed(4);
        fast.start_wave().unwrap();
        run_for(&mut fast, 1100.0);
        assert_eq!(fast.waves().info().spawned, 4);
        assert!((fast.now_ms() - 4400.0).abs() < 1.0);
        // Entity speed is untouched
        assert_eq!(fast.registry().enemies[0].speed, 50.0);
    }

    #[test]
    fn test_frame_is_capped() {
        let mut sim = sim();
        sim.tick(10_000.0);
        assert!((sim.now_ms() - f64::from(MAX_FRAME_MS)).abs() < 1e-3);
    }

    #[test]
    fn test_substeps_never_exceed_step_length() {
        assert_eq!(substeps(FRAME_MS), (1, SIM_STEP_MS));
        assert_eq!(substeps(FRAME_MS * 9.0), (9, SIM_STEP_MS));
        let (steps, dt) = substeps(MAX_FRAME_MS * MAX_SPEED as f32);
        assert_eq!(steps, 54);
        assert!(dt <= SIM_STEP_MS + 1e-4);
        let (steps, dt) = substeps(5.0);
        assert_eq!((steps, dt), (1, 5.0));
    }

    #[test]
    fn test_fast_enemies_finish_wave_at_max_speed() {
        for starting_wave in [3, 6] {
            let mut config = GameConfig::default();
            config.game.starting_wave = starting_wave;
            config.game.starting_health = 1000;
            let mut sim = Simulation::with_map(config, "classic", 5).unwrap();
            sim.set_speed(MAX_SPEED);
            sim.start_wave().unwrap();

            let mut frames = 0;
            while sim.waves().is_active() && frames < 2000 {
                sim.tick(FRAME_MS);
                frames += 1;
            }
            assert!(!sim.waves().is_active(), "wave {starting_wave} never finished");
            assert_eq!(sim.waves().wave(), starting_wave + 1);
            assert!(sim.registry().enemies.is_empty());
            assert!(sim.economy().health() < 1000);
        }
    }

    #[test]
    fn test_max_speed_plays_like_normal_speed() {
        let play = |speed: u32, frames: usize| {
            let mut sim = Simulation::with_map(GameConfig::default(), "classic", 3).unwrap();
            for (kind, x, y) in [
                (TowerKind::Basic, 150.0, 330.0),
                (TowerKind::Rapid, 250.0, 300.0),
                (TowerKind::Cannon, 300.0, 260.0),
                (TowerKind::Multishot, 470.0, 420.0),
            ] {
                sim.place_tower(kind, Vec2::new(x, y)).unwrap();
            }
            sim.set_speed(speed);
            sim.start_wave().unwrap();
            for _ in 0..frames {
                sim.tick(FRAME_MS);
            }
            let snapshot = sim.snapshot();
            let state = serde_json::to_string(&(
                snapshot.economy,
                snapshot.wave,
                snapshot.enemies,
                snapshot.towers,
                snapshot.projectiles,
            ))
            .unwrap();
            (snapshot.now_ms, state)
        };
        let (fast_ms, fast) = play(MAX_SPEED, 100);
        let (slow_ms, slow) = play(1, 900);
        assert_eq!(fast_ms, slow_ms);
        assert_eq!(fast, slow);
        assert!(fast.contains("\"shots_fired\":"));
    }

    #[test]
    fn test_auto_start_after_wave_end() {
        let mut config = GameConfig::default();
        config.waves.base_enemies = 1;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        sim.apply_settings(&Settings {
            auto_start_waves: true,
            ..Settings::default()
        });
        sim.start_wave().unwrap();
        run_for(&mut sim, 4000.0);
        assert_eq!(sim.waves().wave(), 2);
        assert!(!sim.waves().is_active());
        assert!(sim.waves().auto_start_in_ms().is_some());

        run_for(&mut sim, 3100.0);
        assert!(sim.waves().is_active());
        assert!(effects(&sim.drain_events()).contains(&EffectKind::WaveStart(2)));
    }

    #[test]
    fn test_clearing_super_boss_wave_is_victory() {
        let mut config = GameConfig::default();
        config.waves.super_boss_wave = 1;
        config.waves.base_enemies = 1;
        config.enemies.super_boss.damage_to_player = 1;
        config.enemies.super_boss.base_speed = 200.0;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 2000.0);

        assert!(sim.is_victory());
        let kinds = effects(&sim.drain_events());
        assert!(kinds.contains(&EffectKind::SuperBossSpawn));
        assert!(kinds.contains(&EffectKind::Victory));
    }

    #[test]
    fn test_muted_settings_drop_sounds() {
        let mut sim = sim();
        sim.apply_settings(&Settings {
            sound_enabled: false,
            ..Settings::default()
        });
        sim.place_tower(TowerKind::Basic, Vec2::new(60.0, 150.0)).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 3000.0);
        let events = sim.drain_events();
        assert!(effects(&events).contains(&EffectKind::MuzzleFlash));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Sound(_))));
    }

    #[test]
    fn test_smooth_movement_mode() {
        let mut config = GameConfig::default();
        config.game = GameSpec {
            movement_mode: crate::sim::MovementMode::Smooth,
            ..GameSpec::default()
        };
        config.waves.base_enemies = 1;
        let mut sim = Simulation::new(config, line_path(100.0), 1).unwrap();
        sim.start_wave().unwrap();
        run_for(&mut sim, 2000.0);
        let enemy = &sim.registry().enemies[0];
        assert!(enemy.pos.x > 40.0 && enemy.pos.x < 60.0);
        assert_eq!(enemy.pos.y, 100.0);
        run_for(&mut sim, 2000.0);
        assert_eq!(sim.economy().health(), 95);
    }

    #[test]
    fn test_same_seed_same_game() {
        let play = || {
            let mut sim = Simulation::with_map(GameConfig::default(), "classic", 11).unwrap();
            sim.place_tower(TowerKind::Rapid, Vec2::new(300.0, 300.0)).unwrap();
            sim.place_tower(TowerKind::Multishot, Vec2::new(500.0, 400.0)).unwrap();
            sim.set_speed(3);
            for _ in 0..5 {
                sim.start_wave().ok();
                run_for(&mut sim, 8000.0);
            }
            serde_json::to_string(&sim.snapshot()).unwrap()
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_unknown_map() {
        assert!(matches!(
            Simulation::with_map(GameConfig::default(), "nowhere", 0),
            Err(ConfigError::UnknownMap(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_place_then_sell_loses_money(kind_index in 0usize..4, upgrades in 0u32..3) {
            let kind = TowerKind::ALL[kind_index];
            let mut config = GameConfig::default();
            config.game.starting_money = 10_000;
            let mut sim = sim_with(config);
            let id = sim.place_tower(kind, Vec2::new(200.0, 250.0)).unwrap();
            for _ in 0..upgrades {
                sim.upgrade_tower(id).unwrap();
            }
            sim.select_tower(id).unwrap();
            let spent = sim.selected_tower().unwrap().total_spent;

            let refund = sim.sell_selected().unwrap();
            prop_assert_eq!(refund, (f64::from(spent) * 0.7).floor() as i32);
            prop_assert!(refund <= spent);
            prop_assert!(sim.selected_tower().is_none());
            prop_assert!(sim.registry().tower(id).is_none());
            prop_assert_eq!(sim.economy().money(), 10_000 - spent + refund);
        }

        #[test]
        fn prop_upgrades_raise_damage_and_range(levels in 1u32..6) {
            let mut config = GameConfig::default();
            config.game.starting_money = 100_000;
            let mut sim = sim_with(config);
            let id = sim.place_tower(TowerKind::Basic, Vec2::new(200.0, 250.0)).unwrap();
            for _ in 0..levels {
                let before = sim.registry().tower(id).unwrap().clone();
                sim.upgrade_tower(id).unwrap();
                let after = sim.registry().tower(id).unwrap();
                prop_assert!(after.damage > before.damage);
                prop_assert!(after.range > before.range);
                prop_assert_eq!(after.level, before.level + 1);
            }
        }
    }
}
