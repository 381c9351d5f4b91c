//! Frame-driven simulation
//!
//! All gameplay logic lives here. This module must stay deterministic for a
//! given seed and input sequence:
//! - Gameplay randomness comes from the seeded RNG in [`GameState`]
//! - Particles use their own stream and never feed back into gameplay
//! - Collections are scanned in insertion order
//! - No rendering or platform dependencies

pub mod collision;
pub mod enemies;
pub mod entity;
pub mod events;
pub mod math;
pub mod particles;
pub mod player;
pub mod powerups;
pub mod state;
pub mod tick;
pub mod weapons;
pub mod world;

pub use collision::{
    BroadPhase, BroadPhaseMode, CollisionStats, CollisionSystem, RuleKind, RuleTable,
};
pub use enemies::{Enemy, EnemyKind, EnemyManager, Movement, WaveKind};
pub use entity::{Body, CollisionGroup, Entity, EntityId};
pub use events::{EventLog, GameEvent, NullHost, SimHost, SoundCue};
pub use math::Rect;
pub use particles::{ExplosionSize, Particle, ParticleKind, ParticleManager};
pub use player::{Player, PlayerState};
pub use powerups::{Powerup, PowerupKind, PowerupManager};
pub use state::{GamePhase, GameState, SimContext};
pub use tick::{Simulation, SimulationClock, TickInput, tick};
pub use weapons::{Bomb, Explosion, Projectile, WeaponSystem};
pub use world::{GroundKind, GroundTarget, World};
