//! Player ship
//!
//! Death no longer schedules a wall-clock respawn: the ship enters
//! [`PlayerState::Respawning`] and a countdown advanced by the tick brings it
//! back, so pausing also pauses the respawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, CollisionGroup, Entity, EntityId};
use super::events::{GameEvent, SoundCue};
use super::particles::{EXPLOSION_ORANGE, ExplosionSize};
use super::state::SimContext;
use super::weapons::{FireModifiers, Satellite};
use crate::consts::*;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerState {
    Alive,
    /// Destroyed; back in play when `timer` runs out
    Respawning { timer: f32 },
}

/// Timed buffs. Each holds the seconds remaining; reapplying resets the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub shield: f32,
    pub rapid_fire: f32,
    pub multishot: f32,
}

impl ActiveEffects {
    fn tick(&mut self, dt: f32) {
        for timer in [&mut self.shield, &mut self.rapid_fire, &mut self.multishot] {
            *timer = (*timer - dt).max(0.0);
        }
    }

    pub fn shielded(&self) -> bool {
        self.shield > 0.0
    }
}

/// Outcome of the player being struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerHit {
    /// Invulnerable, shielded or already down
    Ignored,
    Damaged,
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub state: PlayerState,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub laser_power: u8,
    pub bomb_power: u8,
    pub satellites: Vec<Satellite>,
    /// Seconds of post-hit invulnerability left
    pub invulnerable: f32,
    pub effects: ActiveEffects,
    pub spawn_point: Vec2,
    orbit_angle: f32,
}

impl Player {
    pub fn new(id: EntityId, tuning: &Tuning) -> Self {
        let spawn_point = Vec2::new(
            tuning.world_width / 2.0,
            tuning.world_height - PLAYER_SPAWN_MARGIN,
        );
        Self {
            body: Body::new(id, spawn_point, Vec2::new(PLAYER_SIZE.0, PLAYER_SIZE.1)),
            state: PlayerState::Alive,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            speed: PLAYER_SPEED,
            laser_power: 1,
            bomb_power: 1,
            satellites: Vec::new(),
            invulnerable: 0.0,
            effects: ActiveEffects::default(),
            spawn_point,
            orbit_angle: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == PlayerState::Alive
    }

    /// Center position while in play
    pub fn position(&self) -> Option<Vec2> {
        self.is_alive().then_some(self.body.pos)
    }

    pub fn fire_modifiers(&self) -> FireModifiers {
        FireModifiers {
            rapid_fire: self.effects.rapid_fire > 0.0,
            multishot: self.effects.multishot > 0.0,
        }
    }

    /// Move by a normalized input direction and keep the ship on screen
    pub fn apply_movement(&mut self, direction: Vec2, dt: f32, width: f32, height: f32) {
        if !self.is_alive() {
            self.body.vel = Vec2::ZERO;
            return;
        }
        let dir = direction.clamp_length_max(1.0);
        self.body.vel = dir * self.speed;
        self.body.pos += self.body.vel * dt;
        let half = self.body.size / 2.0;
        self.body.pos = self
            .body
            .pos
            .clamp(half, Vec2::new(width, height) - half);
    }

    /// Advance timers, satellites and the respawn countdown
    pub fn update(&mut self, ctx: &mut SimContext, dt: f32) {
        if let PlayerState::Respawning { timer } = &mut self.state {
            *timer -= dt;
            if *timer <= 0.0 {
                self.respawn();
            }
            return;
        }

        self.body.age += dt;
        self.invulnerable = (self.invulnerable - dt).max(0.0);
        self.effects.tick(dt);

        self.orbit_angle += SATELLITE_ORBIT_SPEED * dt;
        let count = self.satellites.len().max(1) as f32;
        let center = self.body.pos;
        let base = self.orbit_angle;
        for (i, satellite) in self.satellites.iter_mut().enumerate() {
            satellite.phase = base + i as f32 * std::f32::consts::TAU / count;
            let offset = Vec2::new(satellite.phase.cos(), satellite.phase.sin());
            satellite.pos = center + offset * SATELLITE_ORBIT_RADIUS;
        }

        ctx.particles
            .create_engine_trail(self.body.pos + Vec2::new(0.0, self.body.size.y / 2.0));
    }

    /// Strike the ship for one point of damage
    pub fn take_hit(&mut self, ctx: &mut SimContext) -> PlayerHit {
        if !self.is_alive() || self.invulnerable > 0.0 || self.effects.shielded() {
            return PlayerHit::Ignored;
        }
        self.health -= 1;
        if self.health > 0 {
            self.invulnerable = PLAYER_INVULNERABILITY;
            ctx.events.sound(SoundCue::Hit);
            return PlayerHit::Damaged;
        }

        self.state = PlayerState::Respawning {
            timer: PLAYER_RESPAWN_DELAY,
        };
        self.body.deactivate();
        self.effects = ActiveEffects::default();
        ctx.particles
            .create_explosion(self.body.pos, ExplosionSize::Large, EXPLOSION_ORANGE);
        ctx.events.sound(SoundCue::PlayerDeath);
        ctx.events.push(GameEvent::LifeLost);
        log::info!("Player destroyed");
        PlayerHit::Destroyed
    }

    /// Back at the spawn point, one tier weaker, briefly invulnerable
    fn respawn(&mut self) {
        self.state = PlayerState::Alive;
        self.body.active = true;
        self.body.pos = self.spawn_point;
        self.body.vel = Vec2::ZERO;
        self.health = self.max_health;
        self.invulnerable = PLAYER_INVULNERABILITY;
        self.laser_power = self.laser_power.saturating_sub(1).max(1);
        self.bomb_power = self.bomb_power.saturating_sub(1).max(1);
        self.satellites.pop();
        log::debug!("Player respawned");
    }

    pub fn add_laser_power(&mut self) {
        self.laser_power = (self.laser_power + 1).min(MAX_LASER_POWER);
    }

    pub fn add_bomb_power(&mut self) {
        self.bomb_power = (self.bomb_power + 1).min(MAX_BOMB_POWER);
    }

    pub fn add_satellite(&mut self) -> bool {
        if self.satellites.len() >= MAX_SATELLITES {
            return false;
        }
        self.satellites.push(Satellite::new(self.body.pos));
        true
    }

    pub fn heal(&mut self) {
        self.health = (self.health + 1).min(self.max_health);
    }

    pub fn increase_speed(&mut self) {
        self.speed = (self.speed + 50.0).min(PLAYER_MAX_SPEED);
    }
}

impl Entity for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn group(&self) -> CollisionGroup {
        CollisionGroup::Player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::TestBed;

    #[test]
    fn test_hit_grants_invulnerability() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        assert_eq!(player.take_hit(&mut ctx), PlayerHit::Damaged);
        assert_eq!(player.take_hit(&mut ctx), PlayerHit::Ignored);
        assert_eq!(player.health, PLAYER_MAX_HEALTH - 1);
        player.update(&mut ctx, PLAYER_INVULNERABILITY + 0.01);
        assert_eq!(player.take_hit(&mut ctx), PlayerHit::Damaged);
    }

    #[test]
    fn test_shield_absorbs_hits() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        player.effects.shield = 8.0;
        assert_eq!(player.take_hit(&mut ctx), PlayerHit::Ignored);
        assert_eq!(player.health, PLAYER_MAX_HEALTH);
    }

    #[test]
    fn test_death_and_respawn_downgrade() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        player.health = 1;
        player.laser_power = 3;
        player.bomb_power = 1;
        player.add_satellite();
        player.add_satellite();
        player.body.pos = Vec2::new(100.0, 100.0);

        assert_eq!(player.take_hit(&mut ctx), PlayerHit::Destroyed);
        assert!(!player.is_alive());
        assert!(!player.body.active);
        assert!(ctx.events.pending().contains(&GameEvent::LifeLost));
        assert_eq!(player.take_hit(&mut ctx), PlayerHit::Ignored);

        player.update(&mut ctx, 0.5);
        assert!(!player.is_alive());
        player.update(&mut ctx, 0.6);
        assert!(player.is_alive());
        assert_eq!(player.body.pos, player.spawn_point);
        assert_eq!(player.health, player.max_health);
        assert_eq!(player.laser_power, 2);
        assert_eq!(player.bomb_power, 1);
        assert_eq!(player.satellites.len(), 1);
        assert!(player.invulnerable > 0.0);
    }

    #[test]
    fn test_movement_is_clamped() {
        let mut bed = TestBed::new();
        let ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        for _ in 0..200 {
            player.apply_movement(Vec2::new(-1.0, -1.0).normalize(), 0.016, 800.0, 600.0);
        }
        assert_eq!(player.body.pos, Vec2::new(PLAYER_SIZE.0 / 2.0, PLAYER_SIZE.1 / 2.0));
    }

    #[test]
    fn test_upgrades_are_capped() {
        let mut bed = TestBed::new();
        let ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        for _ in 0..10 {
            player.add_laser_power();
            player.add_bomb_power();
            player.increase_speed();
            player.heal();
        }
        assert!(player.add_satellite());
        assert!(player.add_satellite());
        assert!(!player.add_satellite());
        assert_eq!(player.laser_power, MAX_LASER_POWER);
        assert_eq!(player.bomb_power, MAX_BOMB_POWER);
        assert_eq!(player.speed, PLAYER_MAX_SPEED);
        assert_eq!(player.health, player.max_health);
    }

    #[test]
    fn test_satellites_orbit_at_radius() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        player.add_satellite();
        player.add_satellite();
        player.update(&mut ctx, 0.1);
        for sat in &player.satellites {
            assert!((sat.pos.distance(player.body.pos) - SATELLITE_ORBIT_RADIUS).abs() < 1e-3);
        }
        let gap = player.satellites[0].pos.distance(player.satellites[1].pos);
        assert!((gap - 2.0 * SATELLITE_ORBIT_RADIUS).abs() < 1e-3);
    }
}
