//! Pairwise collision detection and resolution
//!
//! Every frame the pass snapshots all collidable entities into [`Collider`]s,
//! asks a [`BroadPhase`] for candidate pairs, filters them through the
//! symmetric [`RuleTable`], confirms overlap with an AABB test and dispatches
//! the matching handler. Handlers re-check liveness first, so an entity
//! consumed earlier in the same pass is never resolved again.
//!
//! After the pairwise pass, unspent explosions deal their one-shot circle
//! damage and pending bomb detonations splash the ground.

use std::collections::HashMap;

use glam::Vec2;

use super::enemies::{DamageOutcome, EnemyManager};
use super::entity::{CollisionGroup, Entity};
use super::events::SoundCue;
use super::math::{Rect, circle_rect_intersects};
use super::particles::{EXPLOSION_ORANGE, ExplosionSize, SPARK_YELLOW};
use super::player::{Player, PlayerHit};
use super::powerups::PowerupManager;
use super::state::SimContext;
use super::weapons::{WeaponSystem, falloff_damage};
use super::world::World;
use crate::consts::BULLET_SHOOTDOWN_POINTS;

/// Where a collider lives, as indices into its owner's collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Player,
    Enemy(usize),
    /// `owner` is the enemy index, `None` for stray bullets
    EnemyBullet { owner: Option<usize>, index: usize },
    Laser(usize),
    Bomb(usize),
    Powerup(usize),
    Ground(usize),
}

/// Snapshot of one collidable entity
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub handle: Handle,
    pub group: CollisionGroup,
    pub bounds: Rect,
}

/// Resolution handler selected by a group pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    PlayerEnemy,
    PlayerEnemyBullet,
    PlayerPowerup,
    LaserEnemy,
    LaserEnemyBullet,
    BombObstacle,
}

/// Symmetric group-pair matrix indexed by group ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTable {
    cells: [[Option<RuleKind>; CollisionGroup::COUNT]; CollisionGroup::COUNT],
}

impl RuleTable {
    pub fn empty() -> Self {
        Self {
            cells: [[None; CollisionGroup::COUNT]; CollisionGroup::COUNT],
        }
    }

    /// Register a rule for both orders of the pair
    pub fn insert(&mut self, a: CollisionGroup, b: CollisionGroup, kind: RuleKind) {
        self.cells[a.index()][b.index()] = Some(kind);
        self.cells[b.index()][a.index()] = Some(kind);
    }

    pub fn get(&self, a: CollisionGroup, b: CollisionGroup) -> Option<RuleKind> {
        self.cells[a.index()][b.index()]
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        use CollisionGroup::*;
        let mut table = Self::empty();
        table.insert(Player, Enemy, RuleKind::PlayerEnemy);
        table.insert(Player, EnemyBullet, RuleKind::PlayerEnemyBullet);
        table.insert(Player, Powerup, RuleKind::PlayerPowerup);
        table.insert(PlayerBullet, Enemy, RuleKind::LaserEnemy);
        table.insert(PlayerBullet, EnemyBullet, RuleKind::LaserEnemyBullet);
        table.insert(Bomb, Obstacle, RuleKind::BombObstacle);
        table
    }
}

/// Candidate pair generation. Implementations report each unordered pair
/// `(i, j)` with `i < j` at most once; the narrow phase does the exact test.
pub trait BroadPhase {
    fn candidate_pairs(&mut self, colliders: &[Collider], out: &mut Vec<(usize, usize)>);
}

/// O(n²) scan over every pair
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn candidate_pairs(&mut self, colliders: &[Collider], out: &mut Vec<(usize, usize)>) {
        for i in 0..colliders.len() {
            for j in (i + 1)..colliders.len() {
                out.push((i, j));
            }
        }
    }
}

/// Uniform hash grid. Each collider is binned into every cell its bounds touch.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl UniformGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.cells.retain(|_, bucket| !bucket.is_empty());
    }
}

impl BroadPhase for UniformGrid {
    fn candidate_pairs(&mut self, colliders: &[Collider], out: &mut Vec<(usize, usize)>) {
        self.clear();
        for (i, collider) in colliders.iter().enumerate() {
            let bounds = &collider.bounds;
            let (x0, y0) = self.cell_of(Vec2::new(bounds.x, bounds.y));
            let (x1, y1) = self.cell_of(Vec2::new(bounds.right(), bounds.bottom()));
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    self.cells.entry((cx, cy)).or_default().push(i);
                }
            }
        }

        let start = out.len();
        for bucket in self.cells.values() {
            for (n, &i) in bucket.iter().enumerate() {
                for &j in &bucket[n + 1..] {
                    out.push((i.min(j), i.max(j)));
                }
            }
        }
        // Colliders spanning several cells meet more than once
        out[start..].sort_unstable();
        let mut unique = out.split_off(start);
        unique.dedup();
        out.extend(unique);
    }
}

/// Which broad phase the pass uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadPhaseMode {
    /// Brute force up to the tuning threshold, grid above it
    #[default]
    Auto,
    BruteForce,
    Grid,
}

/// Mutable view of every entity owner the pass can touch
pub struct Scene<'a> {
    pub player: &'a mut Player,
    pub lives: &'a mut u8,
    pub weapons: &'a mut WeaponSystem,
    pub enemies: &'a mut EnemyManager,
    pub powerups: &'a mut PowerupManager,
    pub world: &'a mut World,
}

impl Scene<'_> {
    fn gather(&self, out: &mut Vec<Collider>) {
        fn push(out: &mut Vec<Collider>, handle: Handle, entity: &impl Entity) {
            if entity.collidable() {
                out.push(Collider {
                    handle,
                    group: entity.group(),
                    bounds: entity.bounds(),
                });
            }
        }

        push(out, Handle::Player, &*self.player);
        for (e, enemy) in self.enemies.enemies.iter().enumerate() {
            push(out, Handle::Enemy(e), enemy);
            for (index, bullet) in enemy.bullets.iter().enumerate() {
                push(out, Handle::EnemyBullet { owner: Some(e), index }, bullet);
            }
        }
        for (index, bullet) in self.enemies.stray_bullets.iter().enumerate() {
            push(out, Handle::EnemyBullet { owner: None, index }, bullet);
        }
        for (i, laser) in self.weapons.lasers.iter().enumerate() {
            push(out, Handle::Laser(i), laser);
        }
        for (i, bomb) in self.weapons.bombs.iter().enumerate() {
            push(out, Handle::Bomb(i), bomb);
        }
        for (i, powerup) in self.powerups.powerups.iter().enumerate() {
            push(out, Handle::Powerup(i), powerup);
        }
        for (i, target) in self.world.targets.iter().enumerate() {
            push(out, Handle::Ground(i), target);
        }
    }

    /// Whether the entity behind `handle` can still take part in a collision
    fn is_live(&mut self, handle: Handle) -> bool {
        match handle {
            Handle::Player => self.player.collidable(),
            Handle::Enemy(e) => self.enemies.enemies.get(e).is_some_and(|x| x.collidable()),
            Handle::EnemyBullet { owner, index } => self
                .enemies
                .bullet_mut(owner, index)
                .is_some_and(|b| b.collidable()),
            Handle::Laser(i) => self.weapons.lasers.get(i).is_some_and(|x| x.collidable()),
            Handle::Bomb(i) => self.weapons.bombs.get(i).is_some_and(|x| x.collidable()),
            Handle::Powerup(i) => self.powerups.powerups.get(i).is_some_and(|x| x.collidable()),
            Handle::Ground(i) => self.world.targets.get(i).is_some_and(|x| x.collidable()),
        }
    }
}

/// Counters from one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    pub colliders: usize,
    pub candidates: usize,
    pub resolved: usize,
    pub used_grid: bool,
}

#[derive(Debug, Clone)]
pub struct CollisionSystem {
    pub rules: RuleTable,
    pub mode: BroadPhaseMode,
    brute: BruteForce,
    grid: UniformGrid,
    colliders: Vec<Collider>,
    pairs: Vec<(usize, usize)>,
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(RuleTable::default(), 64.0)
    }
}

impl CollisionSystem {
    pub fn new(rules: RuleTable, cell_size: f32) -> Self {
        Self {
            rules,
            mode: BroadPhaseMode::Auto,
            brute: BruteForce,
            grid: UniformGrid::new(cell_size),
            colliders: Vec::new(),
            pairs: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: BroadPhaseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run one full collision pass
    pub fn run(&mut self, ctx: &mut SimContext, scene: &mut Scene) -> CollisionStats {
        self.colliders.clear();
        self.pairs.clear();
        scene.gather(&mut self.colliders);

        let use_grid = match self.mode {
            BroadPhaseMode::Auto => self.colliders.len() > ctx.tuning.brute_force_threshold,
            BroadPhaseMode::BruteForce => false,
            BroadPhaseMode::Grid => true,
        };
        if use_grid {
            self.grid.candidate_pairs(&self.colliders, &mut self.pairs);
        } else {
            self.brute.candidate_pairs(&self.colliders, &mut self.pairs);
        }

        let mut stats = CollisionStats {
            colliders: self.colliders.len(),
            candidates: self.pairs.len(),
            resolved: 0,
            used_grid: use_grid,
        };

        for &(i, j) in &self.pairs {
            let (mut a, mut b) = (self.colliders[i], self.colliders[j]);
            let Some(rule) = self.rules.get(a.group, b.group) else {
                continue;
            };
            if !a.bounds.intersects(&b.bounds) {
                continue;
            }
            // Handlers see the pair in group-ordinal order regardless of scan order
            if a.group.index() > b.group.index() {
                std::mem::swap(&mut a, &mut b);
            }
            if !scene.is_live(a.handle) || !scene.is_live(b.handle) {
                continue;
            }
            if resolve(ctx, scene, rule, a.handle, b.handle) {
                stats.resolved += 1;
            }
        }

        apply_explosions(ctx, scene);
        apply_detonations(ctx, scene);
        stats
    }
}

/// Dispatch one confirmed pair. `a` has the lower group ordinal.
fn resolve(ctx: &mut SimContext, scene: &mut Scene, rule: RuleKind, a: Handle, b: Handle) -> bool {
    match (rule, a, b) {
        (RuleKind::PlayerEnemy, Handle::Player, Handle::Enemy(e)) => player_vs_enemy(ctx, scene, e),
        (RuleKind::PlayerEnemyBullet, Handle::Player, Handle::EnemyBullet { owner, index }) => {
            player_vs_bullet(ctx, scene, owner, index)
        }
        (RuleKind::PlayerPowerup, Handle::Player, Handle::Powerup(p)) => scene
            .powerups
            .collect(ctx, p, scene.player, scene.lives)
            .is_some(),
        (RuleKind::LaserEnemy, Handle::Enemy(e), Handle::Laser(l)) => {
            laser_vs_enemy(ctx, scene, l, e)
        }
        (RuleKind::LaserEnemyBullet, Handle::Laser(l), Handle::EnemyBullet { owner, index }) => {
            laser_vs_bullet(ctx, scene, l, owner, index)
        }
        (RuleKind::BombObstacle, Handle::Enemy(_) | Handle::Ground(_), Handle::Bomb(i)) => {
            let before = scene.weapons.detonations.len();
            scene.weapons.detonate(ctx, i);
            scene.weapons.detonations.len() > before
        }
        _ => {
            log::warn!("No handler for {rule:?} between {a:?} and {b:?}");
            false
        }
    }
}

/// Ramming destroys ordinary enemies outright; the boss shrugs it off.
/// An invulnerable player passes through both enemies and bullets untouched.
fn player_vs_enemy(ctx: &mut SimContext, scene: &mut Scene, e: usize) -> bool {
    if scene.player.invulnerable > 0.0 {
        return false;
    }
    let Some(enemy) = scene.enemies.enemies.get_mut(e) else {
        return false;
    };
    scene.player.take_hit(ctx);
    if enemy.kind != super::enemies::EnemyKind::Boss {
        enemy.die(ctx);
    }
    true
}

fn player_vs_bullet(
    ctx: &mut SimContext,
    scene: &mut Scene,
    owner: Option<usize>,
    index: usize,
) -> bool {
    if scene.player.invulnerable > 0.0 {
        return false;
    }
    let Some(bullet) = scene.enemies.bullet_mut(owner, index) else {
        return false;
    };
    if !bullet.body.deactivate() {
        return false;
    }
    let pos = bullet.body.pos;
    let dir = bullet.body.vel.normalize_or_zero();
    if scene.player.take_hit(ctx) != PlayerHit::Ignored {
        ctx.particles.create_impact(pos, Some(-dir));
    }
    true
}

fn laser_vs_enemy(ctx: &mut SimContext, scene: &mut Scene, l: usize, e: usize) -> bool {
    let (Some(laser), Some(enemy)) =
        (scene.weapons.lasers.get_mut(l), scene.enemies.enemies.get_mut(e))
    else {
        return false;
    };
    if !laser.can_hit(enemy.body.id) {
        return false;
    }
    let outcome = enemy.take_damage(ctx, laser.damage);
    if outcome == DamageOutcome::Ignored {
        return false;
    }
    laser.register_hit(enemy.body.id);
    match outcome {
        DamageOutcome::Ignored => false,
        DamageOutcome::Hit => {
            ctx.particles.create_impact(laser.body.pos, Some(Vec2::NEG_Y));
            ctx.events.sound(SoundCue::Hit);
            true
        }
        DamageOutcome::Killed => true,
    }
}

fn laser_vs_bullet(
    ctx: &mut SimContext,
    scene: &mut Scene,
    l: usize,
    owner: Option<usize>,
    index: usize,
) -> bool {
    let (Some(laser), Some(bullet)) =
        (scene.weapons.lasers.get_mut(l), scene.enemies.bullet_mut(owner, index))
    else {
        return false;
    };
    if !bullet.body.deactivate() {
        return false;
    }
    laser.body.deactivate();
    ctx.events.score(BULLET_SHOOTDOWN_POINTS);
    ctx.particles.create_sparks(bullet.body.pos, 5, SPARK_YELLOW);
    ctx.events.sound(SoundCue::BulletDestroy);
    true
}

/// One damage pass per explosion, against air enemies only
fn apply_explosions(ctx: &mut SimContext, scene: &mut Scene) {
    for explosion in &mut scene.weapons.explosions {
        if !explosion.active || explosion.has_dealt_damage {
            continue;
        }
        explosion.has_dealt_damage = true;
        for enemy in &mut scene.enemies.enemies {
            if !enemy.collidable() || enemy.kind.is_ground() {
                continue;
            }
            let bounds = enemy.bounds();
            if !circle_rect_intersects(explosion.pos, explosion.max_radius, &bounds) {
                continue;
            }
            let distance = bounds.closest_point(explosion.pos).distance(explosion.pos);
            let damage = falloff_damage(explosion.damage, distance, explosion.max_radius);
            if damage > 0 {
                enemy.take_damage(ctx, damage);
            }
        }
    }
}

/// Bomb splash over ground targets and ground enemies
fn apply_detonations(ctx: &mut SimContext, scene: &mut Scene) {
    for detonation in scene.weapons.take_detonations() {
        let fallen = scene.world.apply_splash(ctx, &detonation);
        for enemy in &mut scene.enemies.enemies {
            if !enemy.collidable() || !enemy.kind.is_ground() {
                continue;
            }
            let distance = enemy.body.pos.distance(detonation.pos);
            let damage = falloff_damage(detonation.damage, distance, detonation.radius);
            if damage > 0 && enemy.take_damage(ctx, damage) == DamageOutcome::Killed {
                ctx.particles
                    .create_explosion(enemy.body.pos, ExplosionSize::Small, EXPLOSION_ORANGE);
            }
        }
        log::debug!(
            "Detonation at ({:.0}, {:.0}) power {} flattened {} ground targets",
            detonation.pos.x,
            detonation.pos.y,
            detonation.power,
            fallen
        );
    }
}
