//! GPU-ready instance data

use bytemuck::{Pod, Zeroable};

use super::draw_list::DrawItem;

/// One quad-shaped draw, laid out for direct upload as an instance buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DrawInstance {
    /// Center in world pixels
    pub position: [f32; 2],
    pub size: [f32; 2],
    /// Radians, clockwise with y down
    pub rotation: f32,
    /// [`DrawKind`](super::DrawKind) discriminant for shader branching
    pub kind: u32,
    /// Linear RGBA; alpha already folded in
    pub color: [f32; 4],
}

impl DrawInstance {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn from_item(item: &DrawItem) -> Self {
        Self {
            position: item.position.to_array(),
            size: item.size.to_array(),
            rotation: item.rotation,
            kind: item.kind as u32,
            color: item.color,
        }
    }
}

/// Convert a draw list into instances
pub fn instances(items: &[DrawItem]) -> Vec<DrawInstance> {
    items.iter().map(DrawInstance::from_item).collect()
}

/// Raw bytes of an instance slice
pub fn as_bytes(instances: &[DrawInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

/// Colors for game elements
pub mod colors {
    pub const PLAYER: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
    pub const SATELLITE: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const SHIELD: [f32; 4] = [0.3, 0.7, 1.0, 0.35];
    pub const ENEMY_BULLET: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
    pub const BOMB: [f32; 4] = [1.0, 0.55, 0.0, 1.0];
    pub const EXPLOSION: [f32; 4] = [1.0, 0.45, 0.1, 1.0];
    pub const RUBBLE: [f32; 4] = [0.25, 0.22, 0.2, 1.0];

    /// Laser tint by power tier: cyan through white-hot
    pub fn laser(power: u8) -> [f32; 4] {
        match power {
            0..=1 => [0.0, 1.0, 1.0, 1.0],
            2 => [0.2, 1.0, 0.4, 1.0],
            3 => [1.0, 1.0, 0.2, 1.0],
            4 => [1.0, 0.5, 0.1, 1.0],
            _ => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::DrawKind;
    use glam::Vec2;

    #[test]
    fn test_instance_layout() {
        assert_eq!(DrawInstance::SIZE, 40);
        let items = [DrawItem {
            kind: DrawKind::Laser,
            position: Vec2::new(1.0, 2.0),
            size: Vec2::new(4.0, 16.0),
            rotation: 0.0,
            color: colors::laser(5),
        }];
        let inst = instances(&items);
        assert_eq!(as_bytes(&inst).len(), DrawInstance::SIZE);
        assert_eq!(inst[0].kind, DrawKind::Laser as u32);
        assert_eq!(inst[0].position, [1.0, 2.0]);
    }
}
