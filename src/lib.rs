//! Skyfire - simulation core for a vertically scrolling shooter
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (entities, weapons, enemy AI, collisions, particles)
//! - `renderer`: Draw descriptions consumed by an external renderer
//! - `settings`: Presentation preferences (particle quality)
//! - `tuning`: Data-driven game balance
//! - `error`: Configuration errors

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Largest frame step accepted by the clock (prevents spiral of death after tab suspension)
    pub const FRAME_DT_CAP: f32 = 0.016;

    /// World dimensions (screen space, y grows downward)
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Player defaults
    pub const PLAYER_SIZE: (f32, f32) = (32.0, 48.0);
    pub const PLAYER_SPEED: f32 = 200.0;
    pub const PLAYER_MAX_SPEED: f32 = 300.0;
    pub const PLAYER_MAX_HEALTH: i32 = 3;
    pub const PLAYER_START_LIVES: u8 = 3;
    pub const PLAYER_MAX_LIVES: u8 = 9;
    pub const PLAYER_INVULNERABILITY: f32 = 2.0;
    pub const PLAYER_RESPAWN_DELAY: f32 = 1.0;
    /// Spawn point offset from the bottom edge
    pub const PLAYER_SPAWN_MARGIN: f32 = 100.0;

    /// Weapon tiers
    pub const MAX_LASER_POWER: u8 = 5;
    pub const MAX_BOMB_POWER: u8 = 5;
    pub const MAX_SATELLITES: usize = 2;
    pub const LASER_COOLDOWN: f32 = 0.2;
    pub const BOMB_COOLDOWN: f32 = 0.5;
    pub const SATELLITE_COOLDOWN: f32 = 0.3;
    pub const SATELLITE_ORBIT_RADIUS: f32 = 40.0;
    pub const SATELLITE_ORBIT_SPEED: f32 = 3.0;

    /// Laser defaults
    pub const LASER_SPEED: f32 = 400.0;
    pub const LASER_SIZE: (f32, f32) = (4.0, 16.0);
    /// Hard upper bound on projectile lifetime (seconds)
    pub const PROJECTILE_MAX_AGE: f32 = 5.0;

    /// Bomb defaults
    pub const BOMB_SIZE: (f32, f32) = (6.0, 8.0);
    /// Bomb target distance ahead of the player when no aim point is given
    pub const BOMB_DEFAULT_RANGE: f32 = 200.0;

    /// Explosion volume lifetime (seconds)
    pub const EXPLOSION_LIFETIME: f32 = 0.5;

    /// Enemy bullets
    pub const ENEMY_BULLET_SIZE: (f32, f32) = (4.0, 8.0);
    pub const ENEMY_BULLET_MARGIN: f32 = 50.0;
    /// Enemies are culled this far outside the screen
    pub const ENEMY_CULL_MARGIN: f32 = 100.0;
    /// Spawn y for the trickle spawner (just above the screen)
    pub const ENEMY_SPAWN_Y: f32 = -50.0;

    /// Score awards
    pub const BULLET_SHOOTDOWN_POINTS: u32 = 10;
    pub const POWERUP_COLLECT_POINTS: u32 = 200;
    pub const EXTRA_LIFE_SCORE: u64 = 10_000;
}
