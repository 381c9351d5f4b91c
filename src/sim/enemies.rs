//! Enemy spawning and behavior
//!
//! One concrete [`Enemy`] record covers every type. Behavior differences live
//! in the [`Movement`] strategy and the per-kind stats, so the collision and
//! cleanup passes see uniform data.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, CollisionGroup, Entity, EntityId};
use super::events::{GameEvent, SoundCue};
use super::math::{random_range, weighted_choice};
use super::particles::{EXPLOSION_ORANGE, ExplosionSize};
use super::state::SimContext;
use super::weapons::Projectile;
use crate::consts::*;
use crate::tuning::Tuning;

/// Enemies older than this leave the field without scoring
pub const ENEMY_MAX_AGE: f32 = 120.0;

const BOSS_ENTRY_Y: f32 = 100.0;
const BOSS_PATROL_MARGIN: f32 = 60.0;
const BOSS_RING_BULLETS: usize = 12;
const BOSS_RING_STAGGER: f32 = 0.05;
const BOSS_RING_SPEED: f32 = 120.0;
const SWARM_SIZE: usize = 8;
const SWARM_STAGGER: f32 = 0.2;
const SWARM_SPEED_SCALE: f32 = 1.5;
const FORMATION_SIZE: usize = 5;
const FORMATION_SPACING: f32 = 60.0;
const INTERCEPTOR_CHARGE_SPEED: f32 = 200.0;
const INTERCEPTOR_HOVER: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Drone,
    Fighter,
    Bomber,
    Interceptor,
    /// Ground emplacement that scrolls with the terrain
    Turret,
    Boss,
}

/// Fixed per-kind numbers
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub size: Vec2,
    pub health: i32,
    pub points: u32,
    /// Downward speed (turrets use the scroll speed instead)
    pub speed: f32,
    pub shoot_interval: Option<f32>,
    pub shoot_range: Option<f32>,
    pub bullet_speed: f32,
}

impl EnemyKind {
    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Drone => EnemyStats {
                size: Vec2::new(24.0, 24.0),
                health: 1,
                points: 50,
                speed: 80.0,
                shoot_interval: None,
                shoot_range: None,
                bullet_speed: 0.0,
            },
            EnemyKind::Fighter => EnemyStats {
                size: Vec2::new(32.0, 32.0),
                health: 2,
                points: 100,
                speed: 120.0,
                shoot_interval: Some(3.0),
                shoot_range: None,
                bullet_speed: 200.0,
            },
            EnemyKind::Bomber => EnemyStats {
                size: Vec2::new(48.0, 36.0),
                health: 4,
                points: 200,
                speed: 60.0,
                shoot_interval: Some(4.0),
                shoot_range: None,
                bullet_speed: 150.0,
            },
            EnemyKind::Interceptor => EnemyStats {
                size: Vec2::new(32.0, 32.0),
                health: 1,
                points: 150,
                speed: 150.0,
                shoot_interval: Some(1.5),
                shoot_range: None,
                bullet_speed: 200.0,
            },
            EnemyKind::Turret => EnemyStats {
                size: Vec2::new(28.0, 28.0),
                health: 2,
                points: 150,
                speed: 0.0,
                shoot_interval: Some(2.0),
                shoot_range: Some(300.0),
                bullet_speed: 200.0,
            },
            EnemyKind::Boss => EnemyStats {
                size: Vec2::new(80.0, 60.0),
                health: 20,
                points: 1000,
                speed: 20.0,
                shoot_interval: Some(0.5),
                shoot_range: None,
                bullet_speed: 180.0,
            },
        }
    }

    pub fn is_ground(self) -> bool {
        matches!(self, EnemyKind::Turret)
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Drone => "drone",
            EnemyKind::Fighter => "fighter",
            EnemyKind::Bomber => "bomber",
            EnemyKind::Interceptor => "interceptor",
            EnemyKind::Turret => "turret",
            EnemyKind::Boss => "boss",
        }
    }

    /// Parse a spawn-config name. Unknown names fall back to [`EnemyKind::Drone`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "drone" => EnemyKind::Drone,
            "fighter" => EnemyKind::Fighter,
            "bomber" => EnemyKind::Bomber,
            "interceptor" => EnemyKind::Interceptor,
            "turret" | "ground" => EnemyKind::Turret,
            "boss" => EnemyKind::Boss,
            other => {
                log::warn!("Unknown enemy type '{}', spawning a drone", other);
                EnemyKind::Drone
            }
        }
    }

    fn initial_movement(self, pos: Vec2) -> Movement {
        match self {
            EnemyKind::Drone => Movement::Straight,
            EnemyKind::Fighter => Movement::Sine {
                anchor_x: pos.x,
                amplitude: 25.0,
                frequency: 2.0,
            },
            EnemyKind::Bomber => Movement::Circle {
                center: pos - Vec2::new(40.0, 0.0),
                radius: 40.0,
                angular_speed: 1.5,
                angle: 0.0,
            },
            EnemyKind::Interceptor => Movement::Charge {
                hover: INTERCEPTOR_HOVER,
                launched: false,
            },
            EnemyKind::Turret => Movement::Ground,
            EnemyKind::Boss => Movement::Boss { patrolling: false },
        }
    }
}

/// Trickle spawner weights
const SPAWN_TABLE: [(EnemyKind, u32); 5] = [
    (EnemyKind::Drone, 40),
    (EnemyKind::Fighter, 30),
    (EnemyKind::Bomber, 15),
    (EnemyKind::Interceptor, 15),
    (EnemyKind::Turret, 10),
];

/// Movement strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    /// Constant downward velocity
    Straight,
    /// Horizontal direction flips every `flip_every` seconds and at the walls
    Zigzag { dir: f32, timer: f32, flip_every: f32 },
    /// Falls while weaving around the spawn x
    Sine {
        anchor_x: f32,
        amplitude: f32,
        frequency: f32,
    },
    /// Orbits a center that descends at the enemy's speed
    Circle {
        center: Vec2,
        radius: f32,
        angular_speed: f32,
        angle: f32,
    },
    /// Hovers, then dives at where the player was at launch
    Charge { hover: f32, launched: bool },
    /// Moves with the scrolling ground
    Ground,
    /// Enter from the top, then patrol side to side
    Boss { patrolling: bool },
}

/// Position within a formation wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    pub index: usize,
    pub size: usize,
}

/// A delayed boss ring bullet
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PendingShot {
    pub delay: f32,
    pub dir: Vec2,
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead or inactive; nothing changed
    Ignored,
    Hit,
    Killed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    pub movement: Movement,
    pub health: i32,
    pub max_health: i32,
    pub points: u32,
    pub speed: f32,
    /// Multiplier applied by the boss rage phase
    pub speed_scale: f32,
    pub shoot_timer: f32,
    pub shoot_interval: Option<f32>,
    pub shoot_range: Option<f32>,
    pub bullet_speed: f32,
    /// Bullets fired by this enemy
    pub bullets: Vec<Projectile>,
    pub formation: Option<Formation>,
    /// Boss phase (1 or 2); always 1 for other kinds
    pub phase: u8,
    pub special_timer: f32,
    pub special_interval: f32,
    pub pending_volley: Vec<PendingShot>,
    pub drop_chance: f32,
    dead: bool,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, pos: Vec2, drop_chance: f32) -> Self {
        let stats = kind.stats();
        let vel = match kind {
            EnemyKind::Turret | EnemyKind::Interceptor => Vec2::ZERO,
            _ => Vec2::new(0.0, stats.speed),
        };
        Self {
            body: Body::new(id, pos, stats.size).with_velocity(vel),
            kind,
            movement: kind.initial_movement(pos),
            health: stats.health,
            max_health: stats.health,
            points: stats.points,
            speed: stats.speed,
            speed_scale: 1.0,
            shoot_timer: 0.0,
            shoot_interval: stats.shoot_interval,
            shoot_range: stats.shoot_range,
            bullet_speed: stats.bullet_speed,
            bullets: Vec::new(),
            formation: None,
            phase: 1,
            special_timer: 0.0,
            special_interval: 5.0,
            pending_volley: Vec::new(),
            drop_chance: if kind == EnemyKind::Boss { 1.0 } else { drop_chance },
            dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0 {
            self.health.max(0) as f32 / self.max_health as f32
        } else {
            0.0
        }
    }

    pub fn update(&mut self, ctx: &mut SimContext, dt: f32, player_pos: Option<Vec2>) {
        let tuning = ctx.tuning;
        if self.body.active {
            self.update_movement(dt, player_pos, tuning);
            self.update_shooting(ctx, dt, player_pos);

            let culled = self.body.pos.y > tuning.world_height + ENEMY_CULL_MARGIN
                || self.body.pos.x < -ENEMY_CULL_MARGIN
                || self.body.pos.x > tuning.world_width + ENEMY_CULL_MARGIN;
            if culled || self.body.age > ENEMY_MAX_AGE {
                self.body.deactivate();
            }
        }
        for bullet in &mut self.bullets {
            bullet.update(dt, tuning.world_width, tuning.world_height);
        }
    }

    fn update_movement(&mut self, dt: f32, player_pos: Option<Vec2>, tuning: &Tuning) {
        let width = tuning.world_width;
        let half = self.body.size.x / 2.0;
        let speed = self.speed * self.speed_scale;
        match &mut self.movement {
            Movement::Straight => {
                self.body.integrate(dt);
            }
            Movement::Zigzag {
                dir,
                timer,
                flip_every,
            } => {
                *timer += dt;
                if *timer >= *flip_every {
                    *dir = -*dir;
                    *timer = 0.0;
                }
                self.body.vel = Vec2::new(*dir * speed, speed);
                self.body.integrate(dt);
                // Reverse at the walls, otherwise the drone sticks to them
                if self.body.pos.x < half {
                    self.body.pos.x = half;
                    *dir = dir.abs();
                } else if self.body.pos.x > width - half {
                    self.body.pos.x = width - half;
                    *dir = -dir.abs();
                }
            }
            Movement::Sine {
                anchor_x,
                amplitude,
                frequency,
            } => {
                self.body.vel = Vec2::new(0.0, speed);
                self.body.integrate(dt);
                self.body.pos.x = *anchor_x + *amplitude * (*frequency * self.body.age).sin();
            }
            Movement::Circle {
                center,
                radius,
                angular_speed,
                angle,
            } => {
                center.y += speed * dt;
                *angle += *angular_speed * dt;
                let next = *center + Vec2::new(angle.cos(), angle.sin()) * *radius;
                if dt > 0.0 {
                    self.body.vel = (next - self.body.pos) / dt;
                }
                self.body.pos = next;
                self.body.age += dt;
            }
            Movement::Charge { hover, launched } => {
                if *hover > 0.0 {
                    *hover -= dt;
                    self.body.vel = Vec2::ZERO;
                    self.body.age += dt;
                    return;
                }
                if !*launched {
                    let dir = player_pos
                        .and_then(|p| (p - self.body.pos).try_normalize())
                        .unwrap_or(Vec2::Y);
                    self.body.vel = dir * INTERCEPTOR_CHARGE_SPEED;
                    *launched = true;
                }
                self.body.integrate(dt);
            }
            Movement::Ground => {
                self.body.vel = Vec2::new(0.0, tuning.scroll_speed);
                self.body.integrate(dt);
            }
            Movement::Boss { patrolling } => {
                if !*patrolling {
                    self.body.vel = Vec2::new(0.0, speed);
                    self.body.integrate(dt);
                    if self.body.pos.y >= BOSS_ENTRY_Y {
                        *patrolling = true;
                        self.body.vel = Vec2::new(50.0 * self.speed_scale, 0.0);
                    }
                } else {
                    self.body.integrate(dt);
                    if self.body.pos.x >= width - BOSS_PATROL_MARGIN {
                        self.body.vel.x = -self.body.vel.x.abs();
                    } else if self.body.pos.x <= BOSS_PATROL_MARGIN {
                        self.body.vel.x = self.body.vel.x.abs();
                    }
                }
            }
        }
    }

    fn update_shooting(&mut self, ctx: &mut SimContext, dt: f32, player_pos: Option<Vec2>) {
        if let Some(interval) = self.shoot_interval {
            self.shoot_timer += dt;
            if self.shoot_timer >= interval && self.fire(ctx, player_pos) {
                self.shoot_timer = 0.0;
            }
        }

        if self.kind == EnemyKind::Boss {
            self.special_timer += dt;
            if self.special_timer >= self.special_interval {
                self.queue_ring();
                self.special_timer = 0.0;
            }
        }

        if !self.pending_volley.is_empty() {
            let origin = self.body.pos;
            let mut released = Vec::new();
            self.pending_volley.retain_mut(|shot| {
                shot.delay -= dt;
                if shot.delay <= 0.0 {
                    released.push(shot.dir);
                    false
                } else {
                    true
                }
            });
            for dir in released {
                let bullet =
                    Projectile::enemy_bullet(ctx.ids.next_id(), origin, dir * BOSS_RING_SPEED);
                self.bullets.push(bullet);
            }
        }
    }

    /// Queue the boss ring: one bullet every 50ms around a full circle
    fn queue_ring(&mut self) {
        for i in 0..BOSS_RING_BULLETS {
            let angle = i as f32 / BOSS_RING_BULLETS as f32 * TAU;
            self.pending_volley.push(PendingShot {
                delay: i as f32 * BOSS_RING_STAGGER,
                dir: Vec2::new(angle.cos(), angle.sin()),
            });
        }
    }

    /// Fire this kind's pattern. Returns false if nothing could be fired
    /// (no player to aim at, or out of range).
    fn fire(&mut self, ctx: &mut SimContext, player_pos: Option<Vec2>) -> bool {
        let pos = self.body.pos;
        let speed = self.bullet_speed;
        match self.kind {
            EnemyKind::Drone => false,
            EnemyKind::Bomber => {
                for dx in [-15.0, 0.0, 15.0] {
                    let bullet = Projectile::enemy_bullet(
                        ctx.ids.next_id(),
                        pos + Vec2::new(dx, 10.0),
                        Vec2::new(0.0, speed),
                    );
                    self.bullets.push(bullet);
                }
                true
            }
            EnemyKind::Boss => {
                for angle in [-0.5f32, -0.25, 0.0, 0.25, 0.5] {
                    let dir = Vec2::new(angle.sin(), angle.cos());
                    let muzzle = pos + Vec2::new(0.0, 20.0);
                    let bullet = Projectile::enemy_bullet(ctx.ids.next_id(), muzzle, dir * speed);
                    self.bullets.push(bullet);
                }
                true
            }
            EnemyKind::Fighter | EnemyKind::Interceptor | EnemyKind::Turret => {
                let Some(target) = player_pos else {
                    return false;
                };
                if let Some(range) = self.shoot_range {
                    if pos.distance(target) > range {
                        return false;
                    }
                }
                let origin = pos + Vec2::new(0.0, 10.0);
                let dir = (target - origin).try_normalize().unwrap_or(Vec2::Y);
                self.bullets
                    .push(Projectile::enemy_bullet(ctx.ids.next_id(), origin, dir * speed));
                true
            }
        }
    }

    /// Apply damage. Death runs at most once; damage to a dead enemy is ignored.
    pub fn take_damage(&mut self, ctx: &mut SimContext, amount: i32) -> DamageOutcome {
        if self.dead || !self.body.active || amount <= 0 {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount);

        if self.kind == EnemyKind::Boss
            && self.phase == 1
            && self.health > 0
            && self.health_ratio() <= 0.5
        {
            self.enter_rage_phase();
        }

        if self.health <= 0 {
            self.die(ctx);
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hit
        }
    }

    /// Boss phase two: faster fire, more frequent rings, faster movement.
    /// Guarded by `phase` so it applies once.
    fn enter_rage_phase(&mut self) {
        if self.phase != 1 {
            return;
        }
        self.phase = 2;
        self.shoot_interval = Some(0.3);
        self.special_interval = 3.0;
        self.speed_scale = 1.5;
        self.body.vel *= 1.5;
        log::info!("Boss {} enters phase 2", self.body.id);
    }

    /// Death effects. Returns false if the enemy was already dead.
    pub fn die(&mut self, ctx: &mut SimContext) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.body.deactivate();
        self.pending_volley.clear();

        ctx.events.score(self.points);
        let size = if self.kind == EnemyKind::Boss {
            ExplosionSize::Large
        } else {
            ExplosionSize::Medium
        };
        ctx.particles.create_explosion(self.body.pos, size, EXPLOSION_ORANGE);
        ctx.events.sound(SoundCue::EnemyDeath);
        if self.drop_chance > 0.0 && ctx.rng.random_bool(f64::from(self.drop_chance.min(1.0))) {
            ctx.events.request_drop(self.body.pos);
        }
        log::debug!("{} {} destroyed (+{})", self.kind.name(), self.body.id, self.points);
        true
    }
}

impl Entity for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn group(&self) -> CollisionGroup {
        if self.kind.is_ground() {
            CollisionGroup::Obstacle
        } else {
            CollisionGroup::Enemy
        }
    }

    fn is_dying(&self) -> bool {
        self.dead
    }
}

/// Scripted batch spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveKind {
    Formation,
    Swarm,
    Boss,
}

/// Queued swarm member
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PendingSpawn {
    delay: f32,
    kind: EnemyKind,
    pos: Vec2,
    speed_scale: f32,
}

/// Owns the enemy set and the timed spawners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyManager {
    pub enemies: Vec<Enemy>,
    /// Bullets whose shooter has been removed; they keep flying
    pub stray_bullets: Vec<Projectile>,
    pub spawn_timer: f32,
    pub spawn_interval: f32,
    pub wave_timer: f32,
    /// Waves spawned so far
    pub wave_count: u32,
    pending_spawns: Vec<PendingSpawn>,
}

impl EnemyManager {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            enemies: Vec::new(),
            stray_bullets: Vec::new(),
            spawn_timer: 0.0,
            spawn_interval: tuning.spawn_interval_start,
            wave_timer: 0.0,
            wave_count: 0,
            pending_spawns: Vec::new(),
        }
    }

    pub fn update(&mut self, ctx: &mut SimContext, dt: f32, player_pos: Option<Vec2>) {
        self.spawn_timer += dt;
        self.wave_timer += dt;

        if self.spawn_timer >= self.spawn_interval {
            self.spawn_random(ctx);
            self.spawn_timer = 0.0;
            self.spawn_interval = (self.spawn_interval - ctx.tuning.spawn_interval_decay)
                .max(ctx.tuning.spawn_interval_floor);
        }

        if self.wave_timer >= ctx.tuning.wave_period {
            self.spawn_wave(ctx);
            self.wave_timer = 0.0;
        }

        self.release_pending(ctx, dt);

        for enemy in &mut self.enemies {
            enemy.update(ctx, dt, player_pos);
        }
        for bullet in &mut self.stray_bullets {
            bullet.update(dt, ctx.tuning.world_width, ctx.tuning.world_height);
        }
    }

    fn release_pending(&mut self, ctx: &mut SimContext, dt: f32) {
        if self.pending_spawns.is_empty() {
            return;
        }
        let mut ready = Vec::new();
        self.pending_spawns.retain_mut(|p| {
            p.delay -= dt;
            if p.delay <= 0.0 {
                ready.push(*p);
                false
            } else {
                true
            }
        });
        for p in ready {
            let index = self.spawn(ctx, p.kind, p.pos);
            let enemy = &mut self.enemies[index];
            enemy.speed *= p.speed_scale;
            enemy.body.vel *= p.speed_scale;
            enemy.movement = Movement::Zigzag {
                dir: if ctx.rng.random_bool(0.5) { 1.0 } else { -1.0 },
                timer: 0.0,
                flip_every: 1.0,
            };
        }
    }

    /// Spawn one enemy; returns its index in `enemies`
    pub fn spawn(&mut self, ctx: &mut SimContext, kind: EnemyKind, pos: Vec2) -> usize {
        let enemy = Enemy::new(ctx.ids.next_id(), kind, pos, ctx.tuning.drop_chance);
        self.enemies.push(enemy);
        self.enemies.len() - 1
    }

    /// Spawn by config name (unknown names become drones)
    pub fn spawn_named(&mut self, ctx: &mut SimContext, name: &str, pos: Vec2) -> usize {
        self.spawn(ctx, EnemyKind::from_name(name), pos)
    }

    /// Weighted-random trickle spawn just above the screen
    pub fn spawn_random(&mut self, ctx: &mut SimContext) -> EnemyKind {
        let kind = weighted_choice(ctx.rng, &SPAWN_TABLE).unwrap_or(EnemyKind::Drone);
        let width = ctx.tuning.world_width;
        let x = random_range(ctx.rng, 30.0, width - 30.0);
        self.spawn(ctx, kind, Vec2::new(x, ENEMY_SPAWN_Y));
        kind
    }

    pub fn boss_alive(&self) -> bool {
        self.enemies
            .iter()
            .any(|e| e.kind == EnemyKind::Boss && e.body.active && !e.is_dead())
    }

    /// Roll a wave type and spawn it. Exactly one wave is spawned per call.
    pub fn spawn_wave(&mut self, ctx: &mut SimContext) -> WaveKind {
        let kind = match ctx.rng.random_range(0..3) {
            0 => WaveKind::Formation,
            1 => WaveKind::Swarm,
            _ => WaveKind::Boss,
        };
        self.spawn_wave_of(ctx, kind)
    }

    /// Spawn a specific wave. A boss wave only happens every third wave with
    /// no boss alive; otherwise a formation takes its place.
    pub fn spawn_wave_of(&mut self, ctx: &mut SimContext, requested: WaveKind) -> WaveKind {
        let kind = match requested {
            WaveKind::Boss if self.wave_count % 3 != 0 || self.boss_alive() => WaveKind::Formation,
            other => other,
        };
        let width = ctx.tuning.world_width;
        match kind {
            WaveKind::Formation => {
                let start_x = width / 2.0 - (FORMATION_SIZE as f32 * FORMATION_SPACING) / 2.0
                    + FORMATION_SPACING / 2.0;
                for i in 0..FORMATION_SIZE {
                    let pos = Vec2::new(
                        start_x + i as f32 * FORMATION_SPACING,
                        ENEMY_SPAWN_Y - i as f32 * 20.0,
                    );
                    let index = self.spawn(ctx, EnemyKind::Fighter, pos);
                    let fighter = &mut self.enemies[index];
                    fighter.formation = Some(Formation {
                        index: i,
                        size: FORMATION_SIZE,
                    });
                    fighter.movement = Movement::Straight;
                }
            }
            WaveKind::Swarm => {
                for i in 0..SWARM_SIZE {
                    let x = random_range(ctx.rng, 0.0, width);
                    self.pending_spawns.push(PendingSpawn {
                        delay: i as f32 * SWARM_STAGGER,
                        kind: EnemyKind::Drone,
                        pos: Vec2::new(x, -30.0),
                        speed_scale: SWARM_SPEED_SCALE,
                    });
                }
            }
            WaveKind::Boss => {
                self.spawn(ctx, EnemyKind::Boss, Vec2::new(width / 2.0, -100.0));
            }
        }
        let index = self.wave_count;
        self.wave_count += 1;
        ctx.events.push(GameEvent::Wave { index, kind });
        log::info!("Wave {} spawned: {:?}", index + 1, kind);
        kind
    }

    /// Ids and positions of live air enemies (homing targets)
    pub fn air_targets(&self) -> Vec<(EntityId, Vec2)> {
        self.enemies
            .iter()
            .filter(|e| e.collidable() && !e.kind.is_ground())
            .map(|e| (e.body.id, e.body.pos))
            .collect()
    }

    pub fn living_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.collidable()).count()
    }

    pub fn pending_spawn_count(&self) -> usize {
        self.pending_spawns.len()
    }

    /// Enemy bullet by owner index (`None` for stray bullets)
    pub fn bullet_mut(&mut self, owner: Option<usize>, index: usize) -> Option<&mut Projectile> {
        match owner {
            Some(e) => self.enemies.get_mut(e)?.bullets.get_mut(index),
            None => self.stray_bullets.get_mut(index),
        }
    }

    pub fn bullet_count(&self) -> usize {
        self.enemies.iter().map(|e| e.bullets.len()).sum::<usize>() + self.stray_bullets.len()
    }

    /// Purge dead enemies. Their live bullets become strays.
    pub fn cleanup(&mut self) {
        for enemy in &mut self.enemies {
            enemy.bullets.retain(|b| b.body.active);
            if !enemy.body.active {
                self.stray_bullets.append(&mut enemy.bullets);
            }
        }
        self.enemies.retain(|e| e.body.active);
        self.stray_bullets.retain(|b| b.body.active);
    }

    pub fn reset(&mut self, tuning: &Tuning) {
        *self = Self::new(tuning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::TestBed;

    fn quiet_tuning() -> Tuning {
        Tuning {
            spawn_interval_start: 1000.0,
            spawn_interval_floor: 1000.0,
            wave_period: 1000.0,
            ..Tuning::default()
        }
    }

    #[test]
    fn test_death_is_idempotent() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut enemy = Enemy::new(1, EnemyKind::Drone, Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(enemy.take_damage(&mut ctx, 1), DamageOutcome::Killed);
        assert_eq!(enemy.take_damage(&mut ctx, 1), DamageOutcome::Ignored);
        assert!(!enemy.die(&mut ctx));
        assert!(!enemy.body.active);

        let scores: Vec<_> = ctx
            .events
            .pending()
            .iter()
            .filter(|e| matches!(e, GameEvent::Score(_)))
            .collect();
        assert_eq!(scores, vec![&GameEvent::Score(50)]);
        assert_eq!(ctx.particles.explosion_bursts(), 1);
    }

    #[test]
    fn test_boss_phase_two_applies_once() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut boss = Enemy::new(1, EnemyKind::Boss, Vec2::new(400.0, 100.0), 0.0);
        boss.body.vel = Vec2::new(50.0, 0.0);
        boss.take_damage(&mut ctx, 10);
        assert_eq!(boss.phase, 2);
        assert_eq!(boss.shoot_interval, Some(0.3));
        assert_eq!(boss.body.vel.x, 75.0);
        boss.take_damage(&mut ctx, 5);
        assert_eq!(boss.phase, 2);
        assert_eq!(boss.body.vel.x, 75.0);
        assert_eq!(boss.speed_scale, 1.5);
    }

    #[test]
    fn test_boss_always_drops() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut boss = Enemy::new(1, EnemyKind::Boss, Vec2::new(400.0, 100.0), 0.0);
        boss.take_damage(&mut ctx, 100);
        assert_eq!(ctx.events.take_drops().len(), 1);
    }

    #[test]
    fn test_wave_fires_once_and_resets_timer() {
        let mut bed = TestBed::with_tuning(Tuning {
            spawn_interval_start: 1000.0,
            spawn_interval_floor: 1000.0,
            ..Tuning::default()
        });
        let mut manager = EnemyManager::new(&bed.tuning);
        manager.wave_timer = 29.99;
        let mut ctx = bed.ctx_at(0.0);
        manager.update(&mut ctx, 0.016, None);
        let waves = ctx
            .events
            .pending()
            .iter()
            .filter(|e| matches!(e, GameEvent::Wave { .. }))
            .count();
        assert_eq!(waves, 1);
        assert_eq!(manager.wave_timer, 0.0);
        assert_eq!(manager.wave_count, 1);
        assert!(manager.enemies.len() + manager.pending_spawn_count() > 0);
    }

    #[test]
    fn test_boss_wave_falls_back_to_formation() {
        let mut bed = TestBed::with_tuning(quiet_tuning());
        let mut manager = EnemyManager::new(&bed.tuning);
        let mut ctx = bed.ctx_at(0.0);
        assert_eq!(manager.spawn_wave_of(&mut ctx, WaveKind::Boss), WaveKind::Boss);
        assert!(manager.boss_alive());
        // Not a third wave
        assert_eq!(manager.spawn_wave_of(&mut ctx, WaveKind::Boss), WaveKind::Formation);
        manager.wave_count = 3;
        // Third wave, but the first boss is still alive
        assert_eq!(manager.spawn_wave_of(&mut ctx, WaveKind::Boss), WaveKind::Formation);
        assert_eq!(manager.enemies.iter().filter(|e| e.kind == EnemyKind::Boss).count(), 1);
    }

    #[test]
    fn test_swarm_is_staggered() {
        let mut bed = TestBed::with_tuning(quiet_tuning());
        let mut manager = EnemyManager::new(&bed.tuning);
        let mut ctx = bed.ctx_at(0.0);
        manager.spawn_wave_of(&mut ctx, WaveKind::Swarm);
        manager.update(&mut ctx, 0.01, None);
        assert_eq!(manager.enemies.len(), 1);
        for _ in 0..100 {
            manager.update(&mut ctx, 0.016, None);
        }
        assert_eq!(manager.enemies.len(), SWARM_SIZE);
        assert!(manager.enemies.iter().all(|e| matches!(e.movement, Movement::Zigzag { .. })));
        assert!(manager.enemies.iter().all(|e| e.speed == 80.0 * SWARM_SPEED_SCALE));
    }

    #[test]
    fn test_formation_suppresses_weave() {
        let mut bed = TestBed::with_tuning(quiet_tuning());
        let mut manager = EnemyManager::new(&bed.tuning);
        let mut ctx = bed.ctx_at(0.0);
        manager.spawn_wave_of(&mut ctx, WaveKind::Formation);
        assert_eq!(manager.enemies.len(), FORMATION_SIZE);
        let xs: Vec<f32> = manager.enemies.iter().map(|e| e.body.pos.x).collect();
        manager.update(&mut ctx, 0.5, None);
        for (enemy, x) in manager.enemies.iter().zip(xs) {
            assert_eq!(enemy.body.pos.x, x);
            assert_eq!(enemy.formation.map(|f| f.size), Some(FORMATION_SIZE));
        }
    }

    #[test]
    fn test_zigzag_reverses_at_wall() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut enemy = Enemy::new(1, EnemyKind::Drone, Vec2::new(15.0, 100.0), 0.0);
        enemy.movement = Movement::Zigzag {
            dir: -1.0,
            timer: 0.0,
            flip_every: 10.0,
        };
        enemy.update(&mut ctx, 0.1, None);
        assert_eq!(enemy.body.pos.x, 12.0);
        match enemy.movement {
            Movement::Zigzag { dir, .. } => assert_eq!(dir, 1.0),
            other => panic!("unexpected movement {other:?}"),
        }
        enemy.update(&mut ctx, 0.1, None);
        assert!(enemy.body.pos.x > 12.0);
    }

    #[test]
    fn test_boss_patrol_reverses() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut boss = Enemy::new(1, EnemyKind::Boss, Vec2::new(735.0, 100.0), 0.0);
        boss.shoot_interval = None;
        boss.movement = Movement::Boss { patrolling: true };
        boss.body.vel = Vec2::new(50.0, 0.0);
        for _ in 0..20 {
            boss.update(&mut ctx, 0.1, None);
        }
        assert!(boss.body.vel.x < 0.0);
        assert!(boss.body.pos.x < 800.0 - BOSS_PATROL_MARGIN + 10.0);
    }

    #[test]
    fn test_sine_is_anchored() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut fighter = Enemy::new(1, EnemyKind::Fighter, Vec2::new(300.0, 0.0), 0.0);
        fighter.shoot_interval = None;
        for _ in 0..100 {
            fighter.update(&mut ctx, 0.016, None);
            assert!((fighter.body.pos.x - 300.0).abs() <= 25.0 + 1e-3);
        }
    }

    #[test]
    fn test_turret_fires_only_in_range() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut turret = Enemy::new(1, EnemyKind::Turret, Vec2::new(100.0, 100.0), 0.0);
        turret.update(&mut ctx, 2.5, Some(Vec2::new(700.0, 550.0)));
        assert!(turret.bullets.is_empty());
        turret.update(&mut ctx, 0.016, Some(Vec2::new(150.0, 300.0)));
        assert_eq!(turret.bullets.len(), 1);
        assert_eq!(turret.group(), CollisionGroup::Obstacle);
    }

    #[test]
    fn test_interceptor_hovers_then_charges() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut enemy = Enemy::new(1, EnemyKind::Interceptor, Vec2::new(400.0, 100.0), 0.0);
        enemy.shoot_interval = None;
        for _ in 0..10 {
            enemy.update(&mut ctx, 0.1, Some(Vec2::new(400.0, 500.0)));
        }
        assert_eq!(enemy.body.pos, Vec2::new(400.0, 100.0));
        // Float drift can leave a sliver of hover time, so allow two extra frames
        for _ in 0..12 {
            enemy.update(&mut ctx, 0.1, Some(Vec2::new(400.0, 500.0)));
        }
        assert!(enemy.body.pos.y > 100.0);
        assert!((enemy.body.vel.length() - INTERCEPTOR_CHARGE_SPEED).abs() < 1e-3);
    }

    #[test]
    fn test_boss_ring_is_staggered() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut boss = Enemy::new(1, EnemyKind::Boss, Vec2::new(400.0, 100.0), 0.0);
        boss.shoot_interval = None;
        boss.movement = Movement::Straight;
        boss.body.vel = Vec2::ZERO;
        boss.special_timer = 4.99;
        boss.update(&mut ctx, 0.02, None);
        assert_eq!(boss.bullets.len(), 1);
        for _ in 0..30 {
            boss.update(&mut ctx, 0.02, None);
        }
        assert_eq!(boss.bullets.len(), BOSS_RING_BULLETS);
    }

    #[test]
    fn test_stray_bullets_outlive_shooter() {
        let mut bed = TestBed::with_tuning(quiet_tuning());
        let mut manager = EnemyManager::new(&bed.tuning);
        let mut ctx = bed.ctx_at(0.0);
        let index = manager.spawn(&mut ctx, EnemyKind::Bomber, Vec2::new(400.0, 100.0));
        manager.enemies[index].shoot_timer = 3.99;
        manager.update(&mut ctx, 0.02, None);
        assert_eq!(manager.bullet_count(), 3);
        manager.enemies[index].die(&mut ctx);
        manager.cleanup();
        assert!(manager.enemies.is_empty());
        assert_eq!(manager.stray_bullets.len(), 3);
        manager.update(&mut ctx, 0.02, None);
        assert!(manager.stray_bullets.iter().all(|b| b.body.active));
    }

    #[test]
    fn test_unknown_kind_falls_back_to_drone() {
        assert_eq!(EnemyKind::from_name("mothership"), EnemyKind::Drone);
        assert_eq!(EnemyKind::from_name("Bomber"), EnemyKind::Bomber);
    }

    #[test]
    fn test_trickle_interval_decays_to_floor() {
        let mut bed = TestBed::with_tuning(Tuning {
            spawn_interval_start: 0.52,
            spawn_interval_floor: 0.5,
            spawn_interval_decay: 0.01,
            wave_period: 1000.0,
            ..Tuning::default()
        });
        let mut manager = EnemyManager::new(&bed.tuning);
        let mut ctx = bed.ctx_at(0.0);
        for _ in 0..5 {
            manager.update(&mut ctx, 0.6, None);
        }
        assert_eq!(manager.spawn_interval, 0.5);
        assert!(manager.enemies.len() >= 5);
    }

    #[test]
    fn test_enemies_leave_the_field() {
        let mut bed = TestBed::with_tuning(quiet_tuning());
        let mut manager = EnemyManager::new(&bed.tuning);
        let mut ctx = bed.ctx_at(0.0);
        manager.spawn(&mut ctx, EnemyKind::Drone, Vec2::new(400.0, 650.0));
        manager.update(&mut ctx, 1.0, None);
        manager.cleanup();
        assert!(manager.enemies.is_empty());
        assert!(ctx.events.pending().is_empty(), "culling must not score");
    }
}
