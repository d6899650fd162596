//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame time only, no wall clock
//! - Seeded RNG only
//! - Stable iteration order (spawn and placement order)
//! - No rendering, audio or platform dependencies

pub mod combat;
pub mod economy;
pub mod entities;
pub mod events;
pub mod path;
pub mod placement;
pub mod registry;
pub mod tick;
pub mod wave;

pub use economy::{EconomyState, EconomyStats};
pub use entities::{
    Enemy, EnemyCategory, EnemyId, EnemyStep, MovementMode, Projectile, ProjectileId,
    ProjectileKind, Tower, TowerId, TowerKind,
};
pub use events::{EffectKind, EventBus, GameEvent, SoundKind, SubscriptionId};
pub use path::{PathModel, PathPoint};
pub use placement::PlacementValidator;
pub use registry::EntityRegistry;
pub use tick::{Simulation, Snapshot};
pub use wave::{WaveController, WaveInfo, WavePhase};
