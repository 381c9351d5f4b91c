//! Scrolling ground and its targets

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, CollisionGroup, Entity, EntityId};
use super::events::SoundCue;
use super::math::random_range;
use super::particles::{EXPLOSION_ORANGE, ExplosionSize};
use super::state::SimContext;
use super::weapons::{Detonation, falloff_damage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroundKind {
    Building,
    Tower,
    Facility,
    Radar,
}

impl GroundKind {
    const ALL: [GroundKind; 4] = [
        GroundKind::Building,
        GroundKind::Tower,
        GroundKind::Facility,
        GroundKind::Radar,
    ];

    pub fn size(self) -> Vec2 {
        match self {
            GroundKind::Building => Vec2::new(40.0, 40.0),
            GroundKind::Tower => Vec2::new(20.0, 50.0),
            GroundKind::Facility => Vec2::new(60.0, 40.0),
            GroundKind::Radar => Vec2::new(30.0, 30.0),
        }
    }

    pub fn health(self) -> i32 {
        match self {
            GroundKind::Facility => 3,
            _ => 1,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            GroundKind::Facility => 500,
            _ => 100,
        }
    }
}

/// Bomb-only target fixed to the terrain. Destroyed targets stay as rubble
/// until they scroll off and are rebuilt above the screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTarget {
    pub body: Body,
    pub kind: GroundKind,
    pub health: i32,
    pub destroyed: bool,
}

impl GroundTarget {
    pub fn new(id: EntityId, kind: GroundKind, pos: Vec2) -> Self {
        Self {
            body: Body::new(id, pos, kind.size()),
            kind,
            health: kind.health(),
            destroyed: false,
        }
    }

    /// Returns true if this hit destroyed the target
    pub fn take_damage(&mut self, ctx: &mut SimContext, amount: i32) -> bool {
        if self.destroyed || amount <= 0 {
            return false;
        }
        self.health -= amount;
        if self.health > 0 {
            return false;
        }
        self.destroyed = true;
        self.body.collision_enabled = false;
        ctx.events.score(self.kind.points());
        ctx.events.sound(SoundCue::Explosion);
        ctx.particles
            .create_explosion(self.body.pos, ExplosionSize::Medium, EXPLOSION_ORANGE);
        ctx.particles.create_smoke(self.body.pos, 6);
        true
    }
}

impl Entity for GroundTarget {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn group(&self) -> CollisionGroup {
        CollisionGroup::Obstacle
    }

    fn is_dying(&self) -> bool {
        self.destroyed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub targets: Vec<GroundTarget>,
    /// Total distance scrolled this run
    pub scroll_offset: f32,
}

impl World {
    /// Lay out the initial ground evenly down the screen
    pub fn generate(ctx: &mut SimContext) -> Self {
        let count = ctx.tuning.ground_target_count;
        let spacing = ctx.tuning.world_height / count.max(1) as f32;
        let targets = (0..count)
            .map(|i| {
                let kind = random_kind(ctx);
                let x = random_range(ctx.rng, 40.0, ctx.tuning.world_width - 40.0);
                GroundTarget::new(ctx.ids.next_id(), kind, Vec2::new(x, i as f32 * spacing))
            })
            .collect();
        Self {
            targets,
            scroll_offset: 0.0,
        }
    }

    /// Scroll the ground down; targets past the bottom are rebuilt on top
    pub fn update(&mut self, ctx: &mut SimContext, dt: f32) {
        let step = ctx.tuning.scroll_speed * dt;
        let height = ctx.tuning.world_height;
        self.scroll_offset += step;
        for i in 0..self.targets.len() {
            let target = &mut self.targets[i];
            target.body.pos.y += step;
            target.body.age += dt;
            if target.body.pos.y - target.body.size.y / 2.0 > height {
                let y = target.body.pos.y - height - target.body.size.y * 2.0;
                let kind = random_kind(ctx);
                let x = random_range(ctx.rng, 40.0, ctx.tuning.world_width - 40.0);
                self.targets[i] = GroundTarget::new(ctx.ids.next_id(), kind, Vec2::new(x, y));
            }
        }
    }

    /// Splash a detonation over the ground. Returns how many targets fell.
    pub fn apply_splash(&mut self, ctx: &mut SimContext, detonation: &Detonation) -> usize {
        let mut destroyed = 0;
        for target in &mut self.targets {
            if !target.collidable() {
                continue;
            }
            let distance = target.body.pos.distance(detonation.pos);
            let damage = falloff_damage(detonation.damage, distance, detonation.radius);
            if damage > 0 && target.take_damage(ctx, damage) {
                destroyed += 1;
            }
        }
        destroyed
    }

    pub fn standing_count(&self) -> usize {
        self.targets.iter().filter(|t| !t.destroyed).count()
    }
}

fn random_kind(ctx: &mut SimContext) -> GroundKind {
    GroundKind::ALL[ctx.rng.random_range(0..GroundKind::ALL.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::GameEvent;
    use crate::sim::state::TestBed;

    fn detonation_at(pos: Vec2, power: u8) -> Detonation {
        Detonation {
            pos,
            power,
            damage: i32::from(power) * 2,
            radius: f32::from(power) * 25.0,
        }
    }

    #[test]
    fn test_generate_fills_the_screen() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let world = World::generate(&mut ctx);
        assert_eq!(world.targets.len(), ctx.tuning.ground_target_count);
        assert!(world.targets.iter().all(|t| t.body.pos.y < ctx.tuning.world_height));
    }

    #[test]
    fn test_targets_recycle_above_screen() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut world = World::generate(&mut ctx);
        let before = world.targets.len();
        for _ in 0..1000 {
            world.update(&mut ctx, 0.05);
        }
        assert_eq!(world.targets.len(), before);
        let height = ctx.tuning.world_height;
        for target in &world.targets {
            assert!(target.body.pos.y - target.body.size.y / 2.0 <= height);
        }
    }

    #[test]
    fn test_facility_takes_three_points() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut world = World {
            targets: vec![GroundTarget::new(1, GroundKind::Facility, Vec2::new(100.0, 100.0))],
            scroll_offset: 0.0,
        };
        // Power 1 at the center deals 2
        assert_eq!(world.apply_splash(&mut ctx, &detonation_at(Vec2::new(100.0, 100.0), 1)), 0);
        assert_eq!(world.targets[0].health, 1);
        assert_eq!(world.apply_splash(&mut ctx, &detonation_at(Vec2::new(100.0, 100.0), 1)), 1);
        assert!(ctx.events.pending().contains(&GameEvent::Score(500)));
        // Rubble is not hit again
        assert_eq!(world.apply_splash(&mut ctx, &detonation_at(Vec2::new(100.0, 100.0), 5)), 0);
        assert_eq!(world.standing_count(), 0);
    }

    #[test]
    fn test_splash_respects_radius() {
        let mut bed = TestBed::new();
        let mut ctx = bed.ctx_at(0.0);
        let mut world = World {
            targets: vec![
                GroundTarget::new(1, GroundKind::Radar, Vec2::new(100.0, 100.0)),
                GroundTarget::new(2, GroundKind::Radar, Vec2::new(100.0, 200.0)),
            ],
            scroll_offset: 0.0,
        };
        // Power 2: radius 50
        assert_eq!(world.apply_splash(&mut ctx, &detonation_at(Vec2::new(100.0, 120.0), 2)), 1);
        assert!(world.targets[0].destroyed);
        assert!(!world.targets[1].destroyed);
    }
}
