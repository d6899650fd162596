//! Player health, money and run statistics

use serde::{Deserialize, Serialize};

use super::events::EventBus;
use crate::config::GameSpec;
use crate::error::ActionError;

/// Read-only copy of the economy for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyStats {
    pub health: i32,
    pub money: i32,
    pub towers_built: u32,
    pub enemies_defeated: u32,
    pub game_over: bool,
}

/// Health, money and counters for one run
#[derive(Debug, Clone)]
pub struct EconomyState {
    health: i32,
    money: i32,
    towers_built: u32,
    enemies_defeated: u32,
    game_over: bool,
    starting_health: i32,
    starting_money: i32,
}

impl EconomyState {
    pub fn new(spec: &GameSpec) -> Self {
        Self {
            health: spec.starting_health,
            money: spec.starting_money,
            towers_built: 0,
            enemies_defeated: 0,
            game_over: false,
            starting_health: spec.starting_health,
            starting_money: spec.starting_money,
        }
    }

    /// Back to the starting values; clears game over
    pub fn reset(&mut self) {
        self.health = self.starting_health;
        self.money = self.starting_money;
        self.towers_built = 0;
        self.enemies_defeated = 0;
        self.game_over = false;
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn money(&self) -> i32 {
        self.money
    }

    pub fn towers_built(&self) -> u32 {
        self.towers_built
    }

    pub fn enemies_defeated(&self) -> u32 {
        self.enemies_defeated
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Lose health; may go negative. Game over is decided by the clock's check.
    pub fn take_damage(&mut self, amount: i32) {
        self.health -= amount;
    }

    /// Health has run out (`<= 0`)
    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// Enter game over. Returns true only on the first call since the last reset.
    pub fn mark_game_over(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.game_over = true;
        true
    }

    pub fn can_afford(&self, amount: i32) -> bool {
        self.money >= amount
    }

    pub fn add_money(&mut self, amount: i32, events: &mut EventBus) {
        self.money += amount;
        events.money_changed(self.money, amount);
    }

    /// Deduct `amount` if affordable; otherwise nothing changes
    pub fn spend_money(&mut self, amount: i32, events: &mut EventBus) -> Result<(), ActionError> {
        if !self.can_afford(amount) {
            return Err(ActionError::InsufficientFunds {
                needed: amount,
                available: self.money,
            });
        }
        self.money -= amount;
        events.money_changed(self.money, -amount);
        Ok(())
    }

    pub fn record_tower_built(&mut self) {
        self.towers_built += 1;
    }

    pub fn record_enemy_defeated(&mut self) {
        self.enemies_defeated += 1;
    }

    pub fn stats(&self) -> EconomyStats {
        EconomyStats {
            health: self.health,
            money: self.money,
            towers_built: self.towers_built,
            enemies_defeated: self.enemies_defeated,
            game_over: self.game_over,
        }
    }
}
