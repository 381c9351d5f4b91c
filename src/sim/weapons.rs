//! Lasers, ballistic bombs and explosions
//!
//! The weapon system owns every player projectile. Enemy bullets use the same
//! [`Projectile`] type but live with the enemy that fired them.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, CollisionGroup, Entity, EntityId};
use super::events::SoundCue;
use super::particles::{EXPLOSION_ORANGE, ExplosionSize, SMOKE_GREY};
use super::state::SimContext;
use crate::consts::*;

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Turn rate used by satellite lasers
const SATELLITE_HOMING_STRENGTH: f32 = 6.0;
/// Spread of the two extra multishot lasers (radians from vertical)
const MULTISHOT_ANGLE: f32 = 0.25;

/// Laser spawn offsets relative to the ship nose, by power tier
fn laser_offsets(power: u8) -> &'static [Vec2] {
    const ONE: [Vec2; 1] = [Vec2::new(0.0, -20.0)];
    const THREE: [Vec2; 3] = [
        Vec2::new(0.0, -20.0),
        Vec2::new(-15.0, -10.0),
        Vec2::new(15.0, -10.0),
    ];
    const FIVE: [Vec2; 5] = [
        Vec2::new(0.0, -20.0),
        Vec2::new(-15.0, -10.0),
        Vec2::new(15.0, -10.0),
        Vec2::new(-25.0, 0.0),
        Vec2::new(25.0, 0.0),
    ];
    match power {
        0..=1 => &ONE,
        2..=3 => &THREE,
        _ => &FIVE,
    }
}

/// Linear splash falloff: `ceil(base * (1 - d/R))` inside the radius, 0 outside.
/// Exactly on the boundary the product is 0, so the damage is 0.
pub fn falloff_damage(base: i32, distance: f32, radius: f32) -> i32 {
    if radius <= 0.0 || distance > radius || base <= 0 {
        return 0;
    }
    let ratio = 1.0 - distance / radius;
    (base as f32 * ratio).ceil().max(0.0) as i32
}

/// Fire-rate gate driven by the simulation clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cooldown {
    pub interval: f32,
    last: Option<f32>,
}

impl Cooldown {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// `scale` shortens (< 1) or lengthens the interval for this check
    pub fn ready(&self, now: f32, scale: f32) -> bool {
        match self.last {
            None => true,
            Some(last) => now - last >= self.interval * scale,
        }
    }

    /// Consume the cooldown if it is ready
    pub fn try_fire(&mut self, now: f32, scale: f32) -> bool {
        if self.ready(now, scale) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Laser or enemy bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub body: Body,
    pub owner: Owner,
    pub damage: i32,
    /// Laser tier, used for color only
    pub power: u8,
    pub piercing: bool,
    pub max_pierce: u32,
    pub pierce_count: u32,
    /// Targets already damaged, so a piercing shot never hits one twice
    pub hit_ids: Vec<EntityId>,
    /// Looked up by id every frame; never owns the target
    pub homing_target: Option<EntityId>,
    pub homing_strength: f32,
}

impl Projectile {
    pub fn laser(id: EntityId, pos: Vec2, power: u8) -> Self {
        let size = Vec2::new(LASER_SIZE.0, LASER_SIZE.1);
        Self {
            body: Body::new(id, pos, size).with_velocity(Vec2::new(0.0, -LASER_SPEED)),
            owner: Owner::Player,
            damage: i32::from(power.max(1)),
            power: power.max(1),
            piercing: false,
            max_pierce: 0,
            pierce_count: 0,
            hit_ids: Vec::new(),
            homing_target: None,
            homing_strength: 0.0,
        }
    }

    pub fn enemy_bullet(id: EntityId, pos: Vec2, vel: Vec2) -> Self {
        let size = Vec2::new(ENEMY_BULLET_SIZE.0, ENEMY_BULLET_SIZE.1);
        Self {
            body: Body::new(id, pos, size).with_velocity(vel),
            owner: Owner::Enemy,
            damage: 1,
            power: 1,
            piercing: false,
            max_pierce: 0,
            pierce_count: 0,
            hit_ids: Vec::new(),
            homing_target: None,
            homing_strength: 0.0,
        }
    }

    pub fn with_piercing(mut self, max_pierce: u32) -> Self {
        self.piercing = true;
        self.max_pierce = max_pierce;
        self
    }

    pub fn with_homing(mut self, target: Option<EntityId>, strength: f32) -> Self {
        self.homing_target = target;
        self.homing_strength = strength;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.body.vel = vel;
        self
    }

    /// True if this shot may still damage `target`
    pub fn can_hit(&self, target: EntityId) -> bool {
        self.body.active && !self.hit_ids.contains(&target)
    }

    /// Record a hit on `target`. Returns false (and changes nothing) if the
    /// shot is spent or already hit that target. A piercing shot survives
    /// `max_pierce` hits and is consumed by the next one.
    pub fn register_hit(&mut self, target: EntityId) -> bool {
        if !self.can_hit(target) {
            return false;
        }
        self.hit_ids.push(target);
        if self.piercing && self.pierce_count < self.max_pierce {
            self.pierce_count += 1;
        } else {
            self.body.deactivate();
        }
        true
    }

    /// Bend velocity toward `target_pos` at constant speed
    pub fn steer_toward(&mut self, target_pos: Vec2, dt: f32) {
        if self.homing_strength <= 0.0 {
            return;
        }
        let to_target = target_pos - self.body.pos;
        let Some(desired) = to_target.try_normalize() else {
            return;
        };
        let speed = self.body.vel.length();
        let current = self.body.vel.normalize_or_zero();
        let turn = (self.homing_strength * dt).min(1.0);
        if let Some(dir) = (current + (desired - current) * turn).try_normalize() {
            self.body.vel = dir * speed;
        }
    }

    /// Integrate and retire the shot once it leaves the play field
    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        if !self.body.active {
            return;
        }
        self.body.integrate(dt);
        let gone = match self.owner {
            Owner::Player => {
                self.body.pos.y < -self.body.size.y
                    || self.body.is_outside(width, height, self.body.size.y)
            }
            Owner::Enemy => self.body.is_outside(width, height, ENEMY_BULLET_MARGIN),
        };
        if gone || self.body.age > PROJECTILE_MAX_AGE {
            self.body.deactivate();
        }
    }
}

impl Entity for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn group(&self) -> CollisionGroup {
        match self.owner {
            Owner::Player => CollisionGroup::PlayerBullet,
            Owner::Enemy => CollisionGroup::EnemyBullet,
        }
    }
}

/// Pending area damage produced by a bomb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detonation {
    pub pos: Vec2,
    pub power: u8,
    pub damage: i32,
    pub radius: f32,
}

/// Ballistic bomb with a velocity solved once at launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub body: Body,
    pub target: Vec2,
    pub power: u8,
    pub damage: i32,
    exploded: bool,
}

impl Bomb {
    /// `fall_time = |target - start| / fall_speed`, `vel = (target - start) / fall_time`
    pub fn launch(id: EntityId, start: Vec2, target: Vec2, power: u8, fall_speed: f32) -> Self {
        let distance = start.distance(target);
        let vel = if distance > f32::EPSILON && fall_speed > 0.0 {
            let fall_time = distance / fall_speed;
            (target - start) / fall_time
        } else {
            Vec2::ZERO
        };
        let power = power.clamp(1, MAX_BOMB_POWER);
        Self {
            body: Body::new(id, start, Vec2::new(BOMB_SIZE.0, BOMB_SIZE.1)).with_velocity(vel),
            target,
            power,
            damage: i32::from(power) * 2,
            exploded: false,
        }
    }

    pub fn has_exploded(&self) -> bool {
        self.exploded
    }

    /// Advance the bomb; returns true when it should explode this frame
    pub fn update(&mut self, dt: f32, arrival_epsilon: f32, width: f32, height: f32) -> bool {
        if !self.body.active {
            return false;
        }
        self.body.integrate(dt);
        let to_target = self.target - self.body.pos;
        let arrived = to_target.length() < arrival_epsilon;
        // A large step can carry the bomb past its target
        let passed_y = self.body.vel.y > 0.0 && self.body.pos.y > self.target.y;
        let overshot = to_target.dot(self.body.vel) < 0.0;
        let left_screen = self.body.is_outside(width, height, ENEMY_BULLET_MARGIN);
        arrived || passed_y || overshot || left_screen || self.body.age > PROJECTILE_MAX_AGE
    }

    /// Deactivate and produce the splash request, exactly once
    pub fn explode(&mut self, radius_per_power: f32) -> Option<Detonation> {
        if self.exploded {
            return None;
        }
        self.exploded = true;
        self.body.deactivate();
        Some(Detonation {
            pos: self.body.pos,
            power: self.power,
            damage: self.damage,
            radius: f32::from(self.power) * radius_per_power,
        })
    }
}

impl Entity for Bomb {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn group(&self) -> CollisionGroup {
        CollisionGroup::Bomb
    }
}

/// Expanding damage volume; deals damage in exactly one pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: ExplosionSize,
    pub radius: f32,
    pub max_radius: f32,
    pub damage: i32,
    pub life: f32,
    pub max_life: f32,
    pub has_dealt_damage: bool,
    pub active: bool,
}

impl Explosion {
    pub fn new(id: EntityId, pos: Vec2, size: ExplosionSize, damage: i32) -> Self {
        Self {
            id,
            pos,
            size,
            radius: 0.0,
            max_radius: size.radius(),
            damage,
            life: EXPLOSION_LIFETIME,
            max_life: EXPLOSION_LIFETIME,
            has_dealt_damage: false,
            active: true,
        }
    }

    /// Radius follows a sine ease: grows to `max_radius` at half life, then shrinks
    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.life -= dt;
        let progress = (1.0 - self.life / self.max_life).clamp(0.0, 1.0);
        self.radius = self.max_radius * (progress * PI).sin();
        if self.life <= 0.0 {
            self.active = false;
        }
    }

    pub fn alpha(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// Orbiting option pod that fires homing lasers alongside the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Satellite {
    pub pos: Vec2,
    /// Angular slot around the player (radians)
    pub phase: f32,
    pub cooldown: Cooldown,
}

impl Satellite {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            phase: 0.0,
            cooldown: Cooldown::new(SATELLITE_COOLDOWN),
        }
    }
}

/// Timed weapon modifiers from powerups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireModifiers {
    pub rapid_fire: bool,
    pub multishot: bool,
}

/// Nearest target to `from` in a live target list
pub fn nearest_target(targets: &[(EntityId, Vec2)], from: Vec2) -> Option<EntityId> {
    targets
        .iter()
        .min_by(|a, b| {
            a.1.distance_squared(from)
                .partial_cmp(&b.1.distance_squared(from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(id, _)| *id)
}

/// Owns lasers, bombs and explosions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSystem {
    pub lasers: Vec<Projectile>,
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<Explosion>,
    /// Splash requests not yet applied to ground targets
    pub detonations: Vec<Detonation>,
    laser_cooldown: Cooldown,
    bomb_cooldown: Cooldown,
}

impl Default for WeaponSystem {
    fn default() -> Self {
        Self {
            lasers: Vec::new(),
            bombs: Vec::new(),
            explosions: Vec::new(),
            detonations: Vec::new(),
            laser_cooldown: Cooldown::new(LASER_COOLDOWN),
            bomb_cooldown: Cooldown::new(BOMB_COOLDOWN),
        }
    }
}

impl WeaponSystem {
    pub fn can_fire(&self, now: f32, mods: FireModifiers) -> bool {
        self.laser_cooldown.ready(now, rapid_scale(mods))
    }

    /// Fire a volley from `origin`. Each satellite whose own cooldown is ready
    /// adds one homing laser. Returns the number of lasers spawned.
    pub fn fire_laser(
        &mut self,
        ctx: &mut SimContext,
        origin: Vec2,
        power: u8,
        mods: FireModifiers,
        satellites: &mut [Satellite],
        targets: &[(EntityId, Vec2)],
    ) -> usize {
        if !self.laser_cooldown.try_fire(ctx.now, rapid_scale(mods)) {
            return 0;
        }
        let power = power.clamp(1, MAX_LASER_POWER);
        let before = self.lasers.len();

        for (i, offset) in laser_offsets(power).iter().enumerate() {
            let mut laser = Projectile::laser(ctx.ids.next_id(), origin + *offset, power);
            if power >= MAX_LASER_POWER && i == 0 {
                laser = laser.with_piercing(2);
            }
            self.lasers.push(laser);
        }

        if mods.multishot {
            for angle in [-MULTISHOT_ANGLE, MULTISHOT_ANGLE] {
                let vel = Vec2::new(angle.sin(), -angle.cos()) * LASER_SPEED;
                let muzzle = origin + Vec2::new(0.0, -20.0);
                let laser = Projectile::laser(ctx.ids.next_id(), muzzle, power).with_velocity(vel);
                self.lasers.push(laser);
            }
        }

        let satellite_power = power.saturating_sub(1).max(1);
        for satellite in satellites.iter_mut() {
            if !satellite.cooldown.try_fire(ctx.now, 1.0) {
                continue;
            }
            let target = nearest_target(targets, satellite.pos);
            let laser = Projectile::laser(
                ctx.ids.next_id(),
                satellite.pos + Vec2::new(0.0, -10.0),
                satellite_power,
            )
            .with_homing(target, SATELLITE_HOMING_STRENGTH);
            self.lasers.push(laser);
        }

        ctx.events.sound(SoundCue::Laser);
        self.lasers.len() - before
    }

    /// Launch a bomb toward `target`; returns false while on cooldown
    pub fn fire_bomb(
        &mut self,
        ctx: &mut SimContext,
        start: Vec2,
        target: Vec2,
        power: u8,
    ) -> bool {
        if !self.bomb_cooldown.try_fire(ctx.now, 1.0) {
            return false;
        }
        let fall_speed = ctx.tuning.bomb_fall_speed;
        let bomb = Bomb::launch(ctx.ids.next_id(), start, target, power, fall_speed);
        log::debug!("Bomb {} launched toward ({:.0}, {:.0})", bomb.body.id, target.x, target.y);
        self.bombs.push(bomb);
        ctx.events.sound(SoundCue::Bomb);
        true
    }

    /// Spawn the damage volume, its particles and the splash request
    pub fn create_explosion(&mut self, ctx: &mut SimContext, detonation: Detonation) {
        let size = if detonation.power >= 3 {
            ExplosionSize::Large
        } else {
            ExplosionSize::Medium
        };
        self.explosions.push(Explosion::new(
            ctx.ids.next_id(),
            detonation.pos,
            size,
            detonation.damage,
        ));
        ctx.particles.create_explosion(detonation.pos, size, EXPLOSION_ORANGE);
        ctx.events.sound(SoundCue::Explosion);
        self.detonations.push(detonation);
    }

    /// Detonate the bomb at `index` (bomb hit an obstacle). No-op if already gone.
    pub fn detonate(&mut self, ctx: &mut SimContext, index: usize) {
        let detonation = match self.bombs.get_mut(index) {
            Some(bomb) => bomb.explode(ctx.tuning.blast_radius_per_power),
            None => None,
        };
        if let Some(detonation) = detonation {
            self.create_explosion(ctx, detonation);
        }
    }

    /// Advance all owned projectiles. `targets` lists live air enemies for homing.
    pub fn update(&mut self, ctx: &mut SimContext, dt: f32, targets: &[(EntityId, Vec2)]) {
        let (width, height) = (ctx.tuning.world_width, ctx.tuning.world_height);

        for laser in &mut self.lasers {
            if laser.homing_strength > 0.0 && laser.body.active {
                let current = laser
                    .homing_target
                    .and_then(|id| targets.iter().find(|(t, _)| *t == id));
                let target = match current {
                    Some(found) => Some(*found),
                    None => {
                        // Re-acquire when the old target is gone
                        laser.homing_target = nearest_target(targets, laser.body.pos);
                        laser
                            .homing_target
                            .and_then(|id| targets.iter().find(|(t, _)| *t == id).copied())
                    }
                };
                if let Some((_, pos)) = target {
                    laser.steer_toward(pos, dt);
                }
            }
            laser.update(dt, width, height);
        }

        let mut fired = Vec::new();
        for (i, bomb) in self.bombs.iter_mut().enumerate() {
            if bomb.update(dt, ctx.tuning.bomb_arrival_epsilon, width, height) {
                fired.push(i);
            } else if bomb.body.active {
                ctx.particles.create_trail(bomb.body.pos, -bomb.body.vel, SMOKE_GREY);
            }
        }
        for i in fired {
            self.detonate(ctx, i);
        }

        for explosion in &mut self.explosions {
            explosion.update(dt);
        }
    }

    pub fn take_detonations(&mut self) -> Vec<Detonation> {
        std::mem::take(&mut self.detonations)
    }

    /// Drop inactive lasers, bombs and explosions. Runs after the collision pass.
    pub fn cleanup(&mut self) {
        self.lasers.retain(|l| l.body.active);
        self.bombs.retain(|b| b.body.active);
        self.explosions.retain(|e| e.active);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn rapid_scale(mods: FireModifiers) -> f32 {
    if mods.rapid_fire { 0.5 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::TestBed;
    use proptest::prelude::*;

    #[test]
    fn test_falloff_examples() {
        assert_eq!(falloff_damage(10, 0.0, 50.0), 10);
        assert_eq!(falloff_damage(10, 25.0, 50.0), 5);
        assert_eq!(falloff_damage(10, 50.0, 50.0), 0);
        assert_eq!(falloff_damage(10, 60.0, 50.0), 0);
    }

    #[test]
    fn test_laser_counts_by_power() {
        let mut bed = TestBed::new();
        let mut weapons = WeaponSystem::default();
        let cases = [(1u8, 1usize), (2, 3), (3, 3), (4, 5), (5, 5)];
        for (n, (power, expected)) in cases.into_iter().enumerate() {
            let mut ctx = bed.ctx_at(n as f32);
            let origin = Vec2::new(400.0, 500.0);
            let spawned =
                weapons.fire_laser(&mut ctx, origin, power, FireModifiers::default(), &mut [], &[]);
            assert_eq!(spawned, expected, "power {power}");
        }
    }

    #[test]
    fn test_laser_cooldown_gates_fire() {
        let mut bed = TestBed::new();
        let mut weapons = WeaponSystem::default();
        let origin = Vec2::new(400.0, 500.0);
        let plain = FireModifiers::default();
        assert_eq!(weapons.fire_laser(&mut bed.ctx_at(1.0), origin, 1, plain, &mut [], &[]), 1);
        assert_eq!(weapons.fire_laser(&mut bed.ctx_at(1.1), origin, 1, plain, &mut [], &[]), 0);
        assert_eq!(weapons.fire_laser(&mut bed.ctx_at(1.2), origin, 1, plain, &mut [], &[]), 1);

        // Rapid fire halves the interval
        let rapid = FireModifiers {
            rapid_fire: true,
            ..Default::default()
        };
        assert_eq!(weapons.fire_laser(&mut bed.ctx_at(1.35), origin, 1, rapid, &mut [], &[]), 1);
    }

    #[test]
    fn test_satellites_add_homing_lasers() {
        let mut bed = TestBed::new();
        let mut weapons = WeaponSystem::default();
        let mut sats = vec![
            Satellite::new(Vec2::new(360.0, 500.0)),
            Satellite::new(Vec2::new(440.0, 500.0)),
        ];
        let targets = [(77, Vec2::new(400.0, 100.0))];
        let spawned = weapons.fire_laser(
            &mut bed.ctx_at(0.0),
            Vec2::new(400.0, 500.0),
            3,
            FireModifiers::default(),
            &mut sats,
            &targets,
        );
        assert_eq!(spawned, 5);
        let homing: Vec<_> = weapons.lasers.iter().filter(|l| l.homing_strength > 0.0).collect();
        assert_eq!(homing.len(), 2);
        assert!(homing.iter().all(|l| l.homing_target == Some(77) && l.power == 2));
    }

    #[test]
    fn test_homing_without_targets_flies_straight() {
        let mut bed = TestBed::new();
        let mut weapons = WeaponSystem::default();
        weapons
            .lasers
            .push(Projectile::laser(1, Vec2::new(100.0, 300.0), 1).with_homing(Some(99), 6.0));
        let mut ctx = bed.ctx_at(0.0);
        weapons.update(&mut ctx, 0.1, &[]);
        assert_eq!(weapons.lasers[0].body.pos.x, 100.0);
        assert_eq!(weapons.lasers[0].homing_target, None);
    }

    #[test]
    fn test_piercing_bullet_survives_until_third_hit() {
        let mut laser = Projectile::laser(1, Vec2::ZERO, 1).with_piercing(2);
        assert!(laser.register_hit(10));
        assert!(laser.body.active);
        assert!(!laser.register_hit(10), "same target twice");
        assert!(laser.register_hit(11));
        assert!(laser.body.active);
        assert!(laser.register_hit(12));
        assert!(!laser.body.active);
        assert!(!laser.register_hit(13));
    }

    #[test]
    fn test_ballistic_arrival() {
        let speed = 300.0;
        let mut bomb = Bomb::launch(1, Vec2::ZERO, Vec2::new(100.0, 100.0), 1, speed);
        let expected = Vec2::new(100.0, 100.0).length() / speed;
        let dt = 1.0 / 60.0;
        let mut t = 0.0;
        while !bomb.update(dt, 10.0, 800.0, 600.0) {
            t += dt;
            assert!(t < 2.0, "bomb never arrived");
        }
        t += dt;
        // Arrival happens once within epsilon, never later than the ideal fall time
        assert!(t <= expected + dt, "t={t} expected={expected}");
        assert!(t >= expected - 10.0 / speed - dt, "t={t} expected={expected}");
        assert!(bomb.body.pos.distance(Vec2::new(100.0, 100.0)) < 10.0);
    }

    #[test]
    fn test_bomb_thrown_upward_does_not_explode_at_launch() {
        let mut bomb = Bomb::launch(1, Vec2::new(400.0, 500.0), Vec2::new(400.0, 300.0), 1, 300.0);
        assert!(!bomb.update(1.0 / 60.0, 10.0, 800.0, 600.0));
    }

    #[test]
    fn test_bomb_explodes_once() {
        let mut bomb = Bomb::launch(1, Vec2::ZERO, Vec2::new(0.0, 100.0), 3, 300.0);
        let det = bomb.explode(25.0).unwrap();
        assert_eq!(det.radius, 75.0);
        assert_eq!(det.damage, 6);
        assert!(bomb.explode(25.0).is_none());
    }

    #[test]
    fn test_falling_bomb_leaves_smoke_trail() {
        use crate::sim::particles::ParticleKind;

        let mut bed = TestBed::new();
        let mut weapons = WeaponSystem::default();
        let mut ctx = bed.ctx_at(0.0);
        assert!(weapons.fire_bomb(&mut ctx, Vec2::new(400.0, 500.0), Vec2::new(400.0, 200.0), 1));
        for _ in 0..3 {
            weapons.update(&mut ctx, 1.0 / 60.0, &[]);
        }
        let trail: Vec<_> = ctx
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Trail)
            .collect();
        assert_eq!(trail.len(), 3);
        // Exhaust drifts against the bomb's travel
        assert!(trail.iter().all(|p| p.vel.y > 0.0));
    }

    #[test]
    fn test_explosion_radius_eases_and_expires() {
        let mut e = Explosion::new(1, Vec2::ZERO, ExplosionSize::Large, 4);
        e.update(EXPLOSION_LIFETIME / 2.0);
        assert!((e.radius - 50.0).abs() < 0.01);
        e.update(EXPLOSION_LIFETIME / 2.0);
        assert!(!e.active);
    }

    #[test]
    fn test_bomb_detonation_spawns_explosion_and_splash() {
        let mut bed = TestBed::new();
        let mut weapons = WeaponSystem::default();
        let mut ctx = bed.ctx_at(0.0);
        assert!(weapons.fire_bomb(&mut ctx, Vec2::new(400.0, 300.0), Vec2::new(400.0, 400.0), 3));
        assert!(!weapons.fire_bomb(&mut ctx, Vec2::new(400.0, 300.0), Vec2::new(400.0, 400.0), 3));
        for _ in 0..40 {
            weapons.update(&mut ctx, 1.0 / 60.0, &[]);
        }
        assert_eq!(weapons.explosions.len(), 1);
        assert_eq!(weapons.explosions[0].size, ExplosionSize::Large);
        assert_eq!(weapons.take_detonations().len(), 1);
        weapons.cleanup();
        assert!(weapons.bombs.is_empty());
    }

    proptest! {
        #[test]
        fn prop_falloff_non_increasing(
            base in 0i32..100,
            radius in 1.0f32..200.0,
            a in 0.0f32..300.0,
            b in 0.0f32..300.0,
        ) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(falloff_damage(base, near, radius) >= falloff_damage(base, far, radius));
            if far > radius {
                prop_assert_eq!(falloff_damage(base, far, radius), 0);
            }
        }
    }
}
