//! Shared entity lifecycle
//!
//! Every simulated object embeds a [`Body`] and exposes it through the
//! [`Entity`] trait so the collision and cleanup passes can treat enemies,
//! projectiles, powerups and the player uniformly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::math::Rect;

/// Stable identifier handed out by [`IdAllocator`]
pub type EntityId = u32;

/// Collision group tag. The rule table is indexed by [`CollisionGroup::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionGroup {
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
    Powerup,
    /// Ground targets and ground enemies: lasers fly over them, bombs hit them
    Obstacle,
    Bomb,
}

impl CollisionGroup {
    pub const COUNT: usize = 7;

    pub const ALL: [CollisionGroup; Self::COUNT] = [
        CollisionGroup::Player,
        CollisionGroup::Enemy,
        CollisionGroup::PlayerBullet,
        CollisionGroup::EnemyBullet,
        CollisionGroup::Powerup,
        CollisionGroup::Obstacle,
        CollisionGroup::Bomb,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Monotonic entity id source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Position, motion and lifecycle flags common to all entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub active: bool,
    /// Seconds since spawn (only advances while playing)
    pub age: f32,
    pub collision_enabled: bool,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, size: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            size,
            active: true,
            age: 0.0,
            collision_enabled: true,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    /// Advance position by velocity and age the body
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.age += dt;
    }

    /// Deactivate; returns whether the body was active before the call
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    /// True once the center has left the world expanded by `margin`
    pub fn is_outside(&self, width: f32, height: f32, margin: f32) -> bool {
        self.pos.x < -margin
            || self.pos.x > width + margin
            || self.pos.y < -margin
            || self.pos.y > height + margin
    }
}

/// Lifecycle contract shared by every simulated object
pub trait Entity {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn group(&self) -> CollisionGroup;

    /// Terminal animation state: still drawn, no longer collidable
    fn is_dying(&self) -> bool {
        false
    }

    fn is_active(&self) -> bool {
        self.body().active
    }

    fn bounds(&self) -> Rect {
        self.body().bounds()
    }

    /// Whether the collision pass may test this entity at all
    fn collidable(&self) -> bool {
        let body = self.body();
        body.active && body.collision_enabled && !self.is_dying()
    }
}
