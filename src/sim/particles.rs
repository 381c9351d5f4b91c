//! Pooled visual effects
//!
//! Particles never feed back into gameplay. They draw from their own RNG
//! stream, so shrinking the pool or disabling it entirely leaves every other
//! subsystem bit-for-bit identical.
//!
//! Storage is an arena of slots plus a stack of free indices. Slots move
//! free -> live when an effect is emitted and live -> free only inside
//! [`ParticleManager::update`], so a slot can never be returned twice.

use std::f32::consts::{FRAC_PI_4, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::math::{from_angle, random_range};
use crate::settings::Settings;

/// Linear RGB triple
pub type Rgb = [f32; 3];

/// Convert `0xRRGGBB` to [`Rgb`]
pub const fn rgb(hex: u32) -> Rgb {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

pub const EXPLOSION_ORANGE: Rgb = rgb(0xff4400);
pub const SPARK_YELLOW: Rgb = rgb(0xffff00);
pub const IMPACT_WHITE: Rgb = rgb(0xffffff);
pub const SMOKE_GREY: Rgb = rgb(0x666666);
pub const ENGINE_BLUE: Rgb = rgb(0x0088ff);

const EXPLOSION_MIX: [Rgb; 4] = [rgb(0xffaa00), rgb(0xff6600), rgb(0xffffff), rgb(0xffff00)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Explosion,
    Spark,
    Smoke,
    Trail,
    Impact,
    Powerup,
    EngineTrail,
}

/// Explosion scale shared by the particle burst and the damage volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionSize {
    Small,
    Medium,
    Large,
}

impl ExplosionSize {
    pub fn particle_count(self) -> usize {
        match self {
            ExplosionSize::Small => 8,
            ExplosionSize::Medium => 16,
            ExplosionSize::Large => 24,
        }
    }

    pub fn speed(self) -> f32 {
        match self {
            ExplosionSize::Small => 100.0,
            ExplosionSize::Medium => 150.0,
            ExplosionSize::Large => 200.0,
        }
    }

    pub fn lifespan(self) -> f32 {
        match self {
            ExplosionSize::Small => 0.8,
            ExplosionSize::Medium => 1.2,
            ExplosionSize::Large => 1.6,
        }
    }

    /// Peak radius of the damage volume
    pub fn radius(self) -> f32 {
        match self {
            ExplosionSize::Small => 20.0,
            ExplosionSize::Medium => 35.0,
            ExplosionSize::Large => 50.0,
        }
    }
}

/// A single pooled particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub accel: Vec2,
    pub color: Rgb,
    /// Size at emission; `size` is derived from it every update
    pub base_size: f32,
    pub size: f32,
    pub alpha: f32,
    pub life: f32,
    pub max_life: f32,
    pub age: f32,
    pub kind: ParticleKind,
    pub active: bool,
}

impl Particle {
    fn dormant() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            accel: Vec2::ZERO,
            color: IMPACT_WHITE,
            base_size: 0.0,
            size: 0.0,
            alpha: 0.0,
            life: 0.0,
            max_life: 0.0,
            age: 0.0,
            kind: ParticleKind::Spark,
            active: false,
        }
    }

    fn emit(
        kind: ParticleKind,
        pos: Vec2,
        vel: Vec2,
        accel: Vec2,
        color: Rgb,
        size: f32,
        life: f32,
    ) -> Self {
        Self {
            pos,
            vel,
            accel,
            color,
            base_size: size,
            size,
            alpha: 1.0,
            life,
            max_life: life,
            age: 0.0,
            kind,
            active: true,
        }
    }

    pub fn life_ratio(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.vel += self.accel * dt;
        self.pos += self.vel * dt;
        self.life -= dt;
        self.age += dt;
        if self.life <= 0.0 {
            self.active = false;
            return;
        }
        self.refresh_visuals();

        if matches!(self.kind, ParticleKind::Smoke | ParticleKind::Trail) {
            self.vel *= 0.95f32.powf(dt * 60.0);
        }
    }

    fn refresh_visuals(&mut self) {
        let r = self.life_ratio();
        let (alpha, size) = match self.kind {
            ParticleKind::Explosion => (r, self.base_size * (1.0 - (1.0 - r) * 0.1)),
            ParticleKind::Smoke => (r * 0.6, self.base_size * (1.0 + (1.0 - r) * 0.5)),
            ParticleKind::Trail => (r * 0.8, self.base_size),
            ParticleKind::EngineTrail => (r * 0.7, self.base_size),
            ParticleKind::Powerup => (0.5 + (self.age * 10.0).sin() * 0.3, self.base_size),
            ParticleKind::Spark | ParticleKind::Impact => (r, self.base_size),
        };
        self.alpha = alpha;
        self.size = size;
    }
}

/// Fixed-capacity particle pool with typed emitters
#[derive(Debug, Clone)]
pub struct ParticleManager {
    slots: Vec<Particle>,
    free: Vec<usize>,
    live: Vec<usize>,
    capacity: usize,
    /// Allocate a fresh slot when the pool runs dry instead of dropping the particle
    allow_overflow: bool,
    overflow_warned: bool,
    rng: Pcg32,
    explosion_bursts: u64,
}

impl Default for ParticleManager {
    fn default() -> Self {
        Self::new(0, false, 0)
    }
}

impl ParticleManager {
    pub fn new(capacity: usize, allow_overflow: bool, seed: u64) -> Self {
        Self {
            slots: (0..capacity).map(|_| Particle::dormant()).collect(),
            free: (0..capacity).rev().collect(),
            live: Vec::with_capacity(capacity),
            capacity,
            allow_overflow,
            overflow_warned: false,
            rng: Pcg32::seed_from_u64(seed),
            explosion_bursts: 0,
        }
    }

    pub fn from_settings(settings: &Settings, seed: u64) -> Self {
        Self::new(settings.max_particles(), settings.particle_overflow, seed)
    }

    /// Configured capacity (0 means effects are disabled)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.live.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.free.len()
    }

    /// Slots ever allocated (capacity plus any overflow growth)
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of explosion bursts requested, including ones the pool dropped
    pub fn explosion_bursts(&self) -> u64 {
        self.explosion_bursts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.live.iter().map(|&i| &self.slots[i])
    }

    /// Return every live particle to the pool
    pub fn clear(&mut self) {
        for i in self.live.drain(..) {
            self.slots[i].active = false;
            self.free.push(i);
        }
    }

    fn acquire(&mut self) -> Option<usize> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(i) = self.free.pop() {
            return Some(i);
        }
        if !self.allow_overflow {
            return None;
        }
        if !self.overflow_warned {
            log::warn!("Particle pool exhausted at {} slots, growing", self.slots.len());
            self.overflow_warned = true;
        }
        self.slots.push(Particle::dormant());
        Some(self.slots.len() - 1)
    }

    fn push(&mut self, particle: Particle) {
        if let Some(i) = self.acquire() {
            self.slots[i] = particle;
            self.live.push(i);
        }
    }

    fn jitter(&mut self, pos: Vec2, spread: f32) -> Vec2 {
        pos + Vec2::new(
            random_range(&mut self.rng, -spread, spread),
            random_range(&mut self.rng, -spread, spread),
        )
    }

    /// Radial burst plus a third as many sparks
    pub fn create_explosion(&mut self, pos: Vec2, size: ExplosionSize, color: Rgb) {
        self.explosion_bursts += 1;
        if self.capacity == 0 {
            return;
        }
        let count = size.particle_count();
        let speed = size.speed();
        let lifespan = size.lifespan();
        for i in 0..count {
            let angle = i as f32 / count as f32 * TAU;
            let dir = from_angle(angle);
            let vel = Vec2::new(
                dir.x * random_range(&mut self.rng, speed * 0.5, speed),
                dir.y * random_range(&mut self.rng, speed * 0.5, speed),
            );
            let pick = self.rng.random_range(0..=EXPLOSION_MIX.len());
            let tint = if pick == 0 { color } else { EXPLOSION_MIX[pick - 1] };
            let particle = Particle::emit(
                ParticleKind::Explosion,
                pos,
                vel,
                Vec2::new(0.0, 50.0),
                tint,
                random_range(&mut self.rng, 2.0, 6.0),
                random_range(&mut self.rng, lifespan * 0.7, lifespan),
            );
            self.push(particle);
        }
        self.create_sparks(pos, count / 3, SPARK_YELLOW);
    }

    pub fn create_sparks(&mut self, pos: Vec2, count: usize, color: Rgb) {
        for _ in 0..count {
            let angle = random_range(&mut self.rng, 0.0, TAU);
            let speed = random_range(&mut self.rng, 100.0, 300.0);
            let origin = self.jitter(pos, 5.0);
            let particle = Particle::emit(
                ParticleKind::Spark,
                origin,
                from_angle(angle) * speed,
                Vec2::new(0.0, 200.0),
                color,
                random_range(&mut self.rng, 1.0, 3.0),
                random_range(&mut self.rng, 0.3, 0.8),
            );
            self.push(particle);
        }
    }

    /// Eight fragments scattered around `direction` (or in every direction)
    pub fn create_impact(&mut self, pos: Vec2, direction: Option<Vec2>) {
        for _ in 0..8 {
            let angle = match direction {
                Some(dir) => {
                    dir.y.atan2(dir.x) + random_range(&mut self.rng, -FRAC_PI_4, FRAC_PI_4)
                }
                None => random_range(&mut self.rng, 0.0, TAU),
            };
            let speed = random_range(&mut self.rng, 50.0, 150.0);
            let particle = Particle::emit(
                ParticleKind::Impact,
                pos,
                from_angle(angle) * speed,
                Vec2::new(0.0, 100.0),
                IMPACT_WHITE,
                random_range(&mut self.rng, 1.0, 3.0),
                random_range(&mut self.rng, 0.2, 0.5),
            );
            self.push(particle);
        }
    }

    pub fn create_trail(&mut self, pos: Vec2, vel: Vec2, color: Rgb) {
        let origin = self.jitter(pos, 2.0);
        let drift = vel * random_range(&mut self.rng, 0.1, 0.3);
        let particle = Particle::emit(
            ParticleKind::Trail,
            origin,
            drift,
            Vec2::ZERO,
            color,
            random_range(&mut self.rng, 1.0, 2.0),
            random_range(&mut self.rng, 0.3, 0.6),
        );
        self.push(particle);
    }

    pub fn create_smoke(&mut self, pos: Vec2, count: usize) {
        for _ in 0..count {
            let origin = self.jitter(pos, 5.0);
            let vel = Vec2::new(
                random_range(&mut self.rng, -20.0, 20.0),
                random_range(&mut self.rng, -40.0, -10.0),
            );
            let particle = Particle::emit(
                ParticleKind::Smoke,
                origin,
                vel,
                Vec2::new(0.0, -20.0),
                SMOKE_GREY,
                random_range(&mut self.rng, 3.0, 8.0),
                random_range(&mut self.rng, 1.0, 2.0),
            );
            self.push(particle);
        }
    }

    /// Evenly spaced ring in the powerup's color
    pub fn create_powerup_effect(&mut self, pos: Vec2, color: Rgb) {
        const COUNT: usize = 15;
        for i in 0..COUNT {
            let angle = i as f32 / COUNT as f32 * TAU;
            let speed = random_range(&mut self.rng, 80.0, 120.0);
            let particle = Particle::emit(
                ParticleKind::Powerup,
                pos,
                from_angle(angle) * speed,
                Vec2::ZERO,
                color,
                random_range(&mut self.rng, 2.0, 4.0),
                random_range(&mut self.rng, 0.8, 1.2),
            );
            self.push(particle);
        }
    }

    /// Exhaust puff; emitted on roughly 30% of calls
    pub fn create_engine_trail(&mut self, pos: Vec2) {
        if self.capacity == 0 || self.rng.random_bool(0.7) {
            return;
        }
        let origin = Vec2::new(pos.x + random_range(&mut self.rng, -3.0, 3.0), pos.y);
        let vel = Vec2::new(
            random_range(&mut self.rng, -10.0, 10.0),
            random_range(&mut self.rng, 20.0, 50.0),
        );
        let particle = Particle::emit(
            ParticleKind::EngineTrail,
            origin,
            vel,
            Vec2::new(0.0, 30.0),
            ENGINE_BLUE,
            random_range(&mut self.rng, 1.0, 3.0),
            random_range(&mut self.rng, 0.2, 0.5),
        );
        self.push(particle);
    }

    /// Advance physics and recycle expired particles
    pub fn update(&mut self, dt: f32) {
        for &i in &self.live {
            self.slots[i].update(dt);
        }
        let slots = &self.slots;
        let free = &mut self.free;
        self.live.retain(|&i| {
            if slots[i].active {
                true
            } else {
                free.push(i);
                false
            }
        });
    }
}
