//! Wave state machine
//!
//! `Idle` until a wave is started, `Spawning` while enemies are released on a
//! fixed interval, back to `Idle` once every planned enemy has spawned and
//! none remain alive. The controller only decides *what* to spawn; the
//! simulation places enemies and pays bonuses.

use rand::Rng;
use serde::Serialize;

use super::entities::EnemyCategory;
use crate::config::WaveSpec;
use crate::error::ActionError;

/// Wave phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WavePhase {
    Idle,
    Spawning,
}

/// Read-only wave progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaveInfo {
    pub wave: u32,
    pub planned: u32,
    pub spawned: u32,
    pub active: bool,
    /// Enemies still to be released this wave
    pub remaining: u32,
}

/// Drives wave numbering, enemy composition and spawn cadence
#[derive(Debug, Clone)]
pub struct WaveController {
    spec: WaveSpec,
    starting_wave: u32,
    wave: u32,
    planned: u32,
    spawned: u32,
    phase: WavePhase,
    /// Time accumulated toward the next spawn; frozen while idle
    spawn_timer_ms: f64,
    /// Countdown to an automatic wave start
    auto_start_in_ms: Option<f64>,
}

impl WaveController {
    pub fn new(spec: &WaveSpec, starting_wave: u32) -> Self {
        Self {
            spec: spec.clone(),
            starting_wave,
            wave: starting_wave,
            planned: spec.enemies_planned(starting_wave),
            spawned: 0,
            phase: WavePhase::Idle,
            spawn_timer_ms: 0.0,
            auto_start_in_ms: None,
        }
    }

    /// Back to the starting wave, idle, timers cleared
    pub fn reset(&mut self) {
        *self = Self::new(&self.spec, self.starting_wave);
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == WavePhase::Spawning
    }

    pub fn is_boss_wave(&self) -> bool {
        self.wave == self.spec.boss_wave
    }

    pub fn is_super_boss_wave(&self) -> bool {
        self.wave == self.spec.super_boss_wave
    }

    pub fn info(&self) -> WaveInfo {
        WaveInfo {
            wave: self.wave,
            planned: self.planned,
            spawned: self.spawned,
            active: self.is_active(),
            remaining: self.planned.saturating_sub(self.spawned),
        }
    }

    /// Enter `Spawning`; rejected while a wave is already running
    pub fn start_wave(&mut self) -> Result<u32, ActionError> {
        if self.is_active() {
            return Err(ActionError::WaveInProgress);
        }
        self.phase = WavePhase::Spawning;
        self.auto_start_in_ms = None;
        Ok(self.wave)
    }

    /// Advance the spawn timer and return the enemies due this tick
    pub fn update<R: Rng>(&mut self, dt_ms: f64, rng: &mut R) -> Vec<EnemyCategory> {
        let mut due = Vec::new();
        if !self.is_active() {
            return due;
        }
        self.spawn_timer_ms += dt_ms;
        while self.spawn_timer_ms >= self.spec.spawn_interval_ms {
            self.spawn_timer_ms -= self.spec.spawn_interval_ms;
            if let Some(category) = self.spawn_next(rng) {
                due.push(category);
            }
        }
        due
    }

    /// One spawn decision; `None` once every planned enemy is out
    pub fn spawn_next<R: Rng>(&mut self, rng: &mut R) -> Option<EnemyCategory> {
        if !self.is_active() || self.spawned >= self.planned {
            return None;
        }
        let category = if self.is_super_boss_wave() && self.spawned == 0 {
            EnemyCategory::SuperBoss
        } else if self.is_boss_wave() && self.spawned == 0 {
            EnemyCategory::Boss
        } else if self.wave > self.spec.strong_enemy_start_wave
            && rng.random::<f64>() < self.spec.strong_enemy_chance
        {
            EnemyCategory::Strong
        } else {
            EnemyCategory::Basic
        };
        self.spawned += 1;
        Some(category)
    }

    /// Active, fully spawned and nothing left alive
    pub fn check_completion(&self, live_enemies: usize) -> bool {
        self.is_active() && self.spawned >= self.planned && live_enemies == 0
    }

    /// Close the current wave and plan the next one
    ///
    /// Returns the number of the wave that just finished. The spawn timer
    /// keeps its accumulated time.
    pub fn end_wave(&mut self) -> u32 {
        let finished = self.wave;
        self.phase = WavePhase::Idle;
        self.wave += 1;
        self.planned = self.spec.enemies_planned(self.wave);
        self.spawned = 0;
        finished
    }

    pub fn schedule_auto_start(&mut self) {
        self.auto_start_in_ms = Some(self.spec.auto_start_delay_ms);
    }

    pub fn cancel_auto_start(&mut self) {
        self.auto_start_in_ms = None;
    }

    /// Time left before an automatic start, if one is pending
    pub fn auto_start_in_ms(&self) -> Option<f64> {
        self.auto_start_in_ms
    }

    /// Count down a pending auto-start; true when it fires
    pub fn tick_auto_start(&mut self, dt_ms: f64) -> bool {
        let Some(remaining) = self.auto_start_in_ms.as_mut() else {
            return false;
        };
        *remaining -= dt_ms;
        if *remaining <= 0.0 {
            self.auto_start_in_ms = None;
            return true;
        }
        false
    }
}
