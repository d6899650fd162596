//! Typed events from the simulation to its presentation collaborators
//!
//! The simulation owns one [`EventBus`]. Hosts either subscribe listeners or
//! drain the buffered events after each tick. Effects and sounds are
//! fire-and-forget: nothing in the simulation waits on them.

use std::fmt;

use glam::Vec2;
use serde::Serialize;

use super::entities::TowerId;

/// Visual effect requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectKind {
    MuzzleFlash,
    Death,
    BossDeath,
    SuperBossDeath,
    Placement,
    Upgrade,
    WaveStart(u32),
    BossSpawn,
    SuperBossSpawn,
    GameOver,
    Victory,
}

/// Sound effect requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundKind {
    Shot,
    Cannon,
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    MoneyChanged {
        new_amount: i32,
        delta: i32,
    },
    TowerSelected {
        tower: TowerId,
    },
    TowerDeselected,
    VisualEffect {
        kind: EffectKind,
        /// `None` for screen-wide effects (wave start, game over, victory)
        position: Option<Vec2>,
        amount: Option<i32>,
    },
    Sound(SoundKind),
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Observer list plus a drainable buffer
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u32,
    buffered: Vec<GameEvent>,
    buffering: bool,
    sound_enabled: bool,
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            buffered: Vec::new(),
            buffering: true,
            sound_enabled: true,
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("buffered", &self.buffered.len())
            .field("buffering", &self.buffering)
            .field("sound_enabled", &self.sound_enabled)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener called synchronously for every event
    ///
    /// Buffering is independent of listeners: events keep queueing for
    /// [`EventBus::drain`] until buffering is turned off.
    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Keep events for [`EventBus::drain`] (on by default)
    pub fn set_buffering(&mut self, buffering: bool) {
        self.buffering = buffering;
        if !buffering {
            self.buffered.clear();
        }
    }

    /// Muted buses drop sound requests
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn emit(&mut self, event: GameEvent) {
        if matches!(event, GameEvent::Sound(_)) && !self.sound_enabled {
            return;
        }
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        if self.buffering {
            self.buffered.push(event);
        }
    }

    pub fn money_changed(&mut self, new_amount: i32, delta: i32) {
        self.emit(GameEvent::MoneyChanged { new_amount, delta });
    }

    pub fn effect_at(&mut self, kind: EffectKind, position: Vec2) {
        self.emit(GameEvent::VisualEffect {
            kind,
            position: Some(position),
            amount: None,
        });
    }

    pub fn effect_with_amount(&mut self, kind: EffectKind, position: Vec2, amount: i32) {
        self.emit(GameEvent::VisualEffect {
            kind,
            position: Some(position),
            amount: Some(amount),
        });
    }

    pub fn screen_effect(&mut self, kind: EffectKind) {
        self.emit(GameEvent::VisualEffect {
            kind,
            position: None,
            amount: None,
        });
    }

    pub fn sound(&mut self, kind: SoundKind) {
        self.emit(GameEvent::Sound(kind));
    }

    /// Take every buffered event, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.buffered)
    }
}
