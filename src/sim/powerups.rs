//! Collectible buffs

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, CollisionGroup, Entity, EntityId};
use super::events::SoundCue;
use super::math::{random_range, weighted_choice};
use super::particles::{Rgb, rgb};
use super::player::Player;
use super::state::SimContext;
use crate::consts::*;
use crate::tuning::Tuning;

const POWERUP_SIZE: Vec2 = Vec2::new(24.0, 24.0);
const POWERUP_FALL_SPEED: f32 = 50.0;
const POWERUP_BOB: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Laser tier +1
    Weapon,
    /// Bomb tier +1
    Bomb,
    /// Extra option satellite
    Option,
    Health,
    Shield,
    RapidFire,
    Multishot,
    Speed,
    Life,
}

/// Cumulative-weight spawn table
pub const POWERUP_TABLE: [(PowerupKind, u32); 9] = [
    (PowerupKind::Weapon, 20),
    (PowerupKind::Bomb, 15),
    (PowerupKind::Option, 12),
    (PowerupKind::Health, 12),
    (PowerupKind::Shield, 12),
    (PowerupKind::RapidFire, 10),
    (PowerupKind::Multishot, 10),
    (PowerupKind::Speed, 6),
    (PowerupKind::Life, 3),
];

impl PowerupKind {
    pub fn name(self) -> &'static str {
        match self {
            PowerupKind::Weapon => "weapon",
            PowerupKind::Bomb => "bomb",
            PowerupKind::Option => "option",
            PowerupKind::Health => "health",
            PowerupKind::Shield => "shield",
            PowerupKind::RapidFire => "rapidfire",
            PowerupKind::Multishot => "multishot",
            PowerupKind::Speed => "speed",
            PowerupKind::Life => "life",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            PowerupKind::Weapon => rgb(0xff0000),
            PowerupKind::Bomb => rgb(0xff8800),
            PowerupKind::Option => rgb(0x00ffff),
            PowerupKind::Health => rgb(0x00ff00),
            PowerupKind::Shield => rgb(0x0088ff),
            PowerupKind::RapidFire => rgb(0xffff00),
            PowerupKind::Multishot => rgb(0xff00ff),
            PowerupKind::Speed => rgb(0xffffff),
            PowerupKind::Life => rgb(0xff88cc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub body: Body,
    pub kind: PowerupKind,
    /// Seconds until it expires uncollected
    pub life_timer: f32,
    bob_phase: f32,
}

impl Powerup {
    pub fn new(id: EntityId, kind: PowerupKind, pos: Vec2, lifetime: f32) -> Self {
        Self {
            body: Body::new(id, pos, POWERUP_SIZE)
                .with_velocity(Vec2::new(0.0, POWERUP_FALL_SPEED)),
            kind,
            life_timer: lifetime,
            bob_phase: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        if !self.body.active {
            return;
        }
        self.body.integrate(dt);
        self.bob_phase += dt * 3.0;
        self.body.pos.x += self.bob_phase.sin() * POWERUP_BOB * dt;

        self.life_timer -= dt;
        if self.life_timer <= 0.0 || self.body.is_outside(width, height, 50.0) {
            self.body.deactivate();
        }
    }

    /// Take the powerup. Only the first call on a live powerup yields its kind.
    pub fn collect(&mut self) -> Option<PowerupKind> {
        self.body.deactivate().then_some(self.kind)
    }

    /// Blink during the last two seconds
    pub fn visible(&self) -> bool {
        self.life_timer > 2.0 || (self.life_timer * 8.0).fract() < 0.5
    }
}

impl Entity for Powerup {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn group(&self) -> CollisionGroup {
        CollisionGroup::Powerup
    }
}

/// Apply a collected powerup to the player. `Life` raises `lives` (capped).
pub fn apply_powerup(kind: PowerupKind, player: &mut Player, lives: &mut u8, tuning: &Tuning) {
    match kind {
        PowerupKind::Weapon => player.add_laser_power(),
        PowerupKind::Bomb => player.add_bomb_power(),
        PowerupKind::Option => {
            player.add_satellite();
        }
        PowerupKind::Health => player.heal(),
        PowerupKind::Shield => player.effects.shield = tuning.shield_duration,
        PowerupKind::RapidFire => player.effects.rapid_fire = tuning.timed_powerup_duration,
        PowerupKind::Multishot => player.effects.multishot = tuning.timed_powerup_duration,
        PowerupKind::Speed => player.increase_speed(),
        PowerupKind::Life => *lives = (*lives + 1).min(PLAYER_MAX_LIVES),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerupManager {
    pub powerups: Vec<Powerup>,
    pub spawn_timer: f32,
}

impl Default for PowerupManager {
    fn default() -> Self {
        Self {
            powerups: Vec::new(),
            spawn_timer: 0.0,
        }
    }
}

impl PowerupManager {
    pub fn update(&mut self, ctx: &mut SimContext, dt: f32) {
        self.spawn_timer += dt;
        if self.spawn_timer >= ctx.tuning.powerup_spawn_interval {
            self.spawn_timer = 0.0;
            let x = random_range(ctx.rng, 30.0, ctx.tuning.world_width - 30.0);
            self.spawn(ctx, Vec2::new(x, -30.0), None);
        }

        for pos in ctx.events.take_drops() {
            self.spawn(ctx, pos, None);
        }

        let (width, height) = (ctx.tuning.world_width, ctx.tuning.world_height);
        for powerup in &mut self.powerups {
            powerup.update(dt, width, height);
        }
    }

    /// Spawn a powerup; `None` rolls the kind from the weight table
    pub fn spawn(&mut self, ctx: &mut SimContext, pos: Vec2, kind: Option<PowerupKind>) -> usize {
        let kind = kind
            .or_else(|| weighted_choice(ctx.rng, &POWERUP_TABLE))
            .unwrap_or(PowerupKind::Weapon);
        let powerup = Powerup::new(ctx.ids.next_id(), kind, pos, ctx.tuning.powerup_lifetime);
        log::debug!("Powerup {} ({}) spawned", powerup.body.id, kind.name());
        self.powerups.push(powerup);
        self.powerups.len() - 1
    }

    /// Collect the powerup at `index` for the player. No-op if already taken.
    pub fn collect(
        &mut self,
        ctx: &mut SimContext,
        index: usize,
        player: &mut Player,
        lives: &mut u8,
    ) -> Option<PowerupKind> {
        let powerup = self.powerups.get_mut(index)?;
        let kind = powerup.collect()?;
        apply_powerup(kind, player, lives, ctx.tuning);
        ctx.events.score(POWERUP_COLLECT_POINTS);
        ctx.events.sound(SoundCue::Powerup);
        ctx.particles.create_powerup_effect(powerup.body.pos, kind.color());
        log::debug!("Collected {}", kind.name());
        Some(kind)
    }

    pub fn cleanup(&mut self) {
        self.powerups.retain(|p| p.body.active);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::GameEvent;
    use crate::sim::state::TestBed;

    #[test]
    fn test_timed_powerup_resets_not_stacks() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        let mut lives = 3;
        let mut manager = PowerupManager::default();
        let duration = ctx.tuning.timed_powerup_duration;

        let a = manager.spawn(&mut ctx, Vec2::new(100.0, 100.0), Some(PowerupKind::RapidFire));
        manager.collect(&mut ctx, a, &mut player, &mut lives);
        player.update(&mut ctx, 4.0);
        assert!((player.effects.rapid_fire - (duration - 4.0)).abs() < 1e-4);

        let b = manager.spawn(&mut ctx, Vec2::new(100.0, 100.0), Some(PowerupKind::RapidFire));
        manager.collect(&mut ctx, b, &mut player, &mut lives);
        assert_eq!(player.effects.rapid_fire, duration);

        player.update(&mut ctx, duration + 0.1);
        assert!(!player.fire_modifiers().rapid_fire);
    }

    #[test]
    fn test_collected_at_most_once() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut player = Player::new(1, ctx.tuning);
        let mut lives = 3;
        let mut manager = PowerupManager::default();
        let i = manager.spawn(&mut ctx, Vec2::new(50.0, 50.0), Some(PowerupKind::Weapon));

        assert_eq!(
            manager.collect(&mut ctx, i, &mut player, &mut lives),
            Some(PowerupKind::Weapon)
        );
        assert_eq!(manager.collect(&mut ctx, i, &mut player, &mut lives), None);
        assert_eq!(player.laser_power, 2);
        let scores = ctx
            .events
            .pending()
            .iter()
            .filter(|e| matches!(e, GameEvent::Score(_)))
            .count();
        assert_eq!(scores, 1);
    }

    #[test]
    fn test_expiry_deactivates_without_effect() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut manager = PowerupManager::default();
        manager.spawn(&mut ctx, Vec2::new(100.0, 0.0), Some(PowerupKind::Shield));
        for _ in 0..((ctx.tuning.powerup_lifetime / 0.1) as usize + 2) {
            manager.update(&mut ctx, 0.1);
        }
        manager.cleanup();
        assert!(manager.powerups.is_empty());
    }

    #[test]
    fn test_life_is_capped() {
        let tuning = Tuning::default();
        let mut player = Player::new(1, &tuning);
        let mut lives = PLAYER_MAX_LIVES;
        apply_powerup(PowerupKind::Life, &mut player, &mut lives, &tuning);
        assert_eq!(lives, PLAYER_MAX_LIVES);
        lives = 2;
        apply_powerup(PowerupKind::Life, &mut player, &mut lives, &tuning);
        assert_eq!(lives, 3);
    }

    #[test]
    fn test_periodic_and_drop_spawns() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut manager = PowerupManager::default();
        ctx.events.request_drop(Vec2::new(200.0, 200.0));
        manager.update(&mut ctx, 0.016);
        assert_eq!(manager.powerups.len(), 1);

        let interval = ctx.tuning.powerup_spawn_interval;
        manager.update(&mut ctx, interval);
        assert_eq!(manager.powerups.len(), 2);
        assert_eq!(manager.spawn_timer, 0.0);
    }
}
