use bitflags::bitflags;
use macroquad::prelude::*;
use serde::Deserialize;

use crate::cell::Cell;
use crate::config::Layout;
use crate::consts::SLOPE_UNIT;
use crate::direction::Direction;
use crate::map::MapId;

/// Terrain classification of a whole map, as stored in level data.
///
/// Unnamed byte values are valid and behave like [`CollisionData::NONE`]
/// for every predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct CollisionData(pub u8);

impl CollisionData {
    pub const NONE: Self = Self(0x00);
    pub const SLOPE_16_8: Self = Self(0x01);
    pub const SLOPE_8_0: Self = Self(0x02);
    pub const SLOPE_8_16: Self = Self(0x03);
    pub const SLOPE_0_8: Self = Self(0x04);
    pub const SLOPE_16_12: Self = Self(0x05);
    pub const SLOPE_12_8: Self = Self(0x06);
    pub const SLOPE_8_4: Self = Self(0x07);
    pub const SLOPE_4_0: Self = Self(0x08);
    pub const SLOPE_12_16: Self = Self(0x09);
    pub const SLOPE_8_12: Self = Self(0x0A);
    pub const SLOPE_4_8: Self = Self(0x0B);
    pub const SLOPE_0_4: Self = Self(0x0C);
    pub const WATER: Self = Self(0x0D);
    pub const WATER_SURFACE: Self = Self(0x0E);
    pub const MUD: Self = Self(0x11);
    pub const LADDER: Self = Self(0x12);
    pub const TOP_LADDER: Self = Self(0x13);
    pub const TOP_MUD: Self = Self(0x1C);
    pub const LAVA: Self = Self(0x33);
    pub const SOLID2: Self = Self(0x34);
    pub const SOLID3: Self = Self(0x35);
    pub const UNCLIMBABLE_SOLID: Self = Self(0x36);
    pub const LEFT_CONVEYOR: Self = Self(0x37);
    pub const RIGHT_CONVEYOR: Self = Self(0x38);
    pub const UP_SLOPE_BASE: Self = Self(0x39);
    pub const DOWN_SLOPE_BASE: Self = Self(0x3A);
    pub const SOLID: Self = Self(0x3B);
    pub const BREAKABLE: Self = Self(0x3C);
    pub const DOOR: Self = Self(0x3D);
    pub const NON_LETHAL_SPIKE: Self = Self(0x3E);
    pub const LETHAL_SPIKE: Self = Self(0x3F);
    pub const LEFT_CONVEYOR_SLOPE_16_12: Self = Self(0x45);
    pub const LEFT_CONVEYOR_SLOPE_12_8: Self = Self(0x46);
    pub const LEFT_CONVEYOR_SLOPE_8_4: Self = Self(0x47);
    pub const LEFT_CONVEYOR_SLOPE_4_0: Self = Self(0x48);
    pub const RIGHT_CONVEYOR_SLOPE_12_16: Self = Self(0x49);
    pub const RIGHT_CONVEYOR_SLOPE_8_12: Self = Self(0x4A);
    pub const RIGHT_CONVEYOR_SLOPE_4_8: Self = Self(0x4B);
    pub const RIGHT_CONVEYOR_SLOPE_0_4: Self = Self(0x4C);
    pub const SEMI_SOLID: Self = Self(0x53);
    pub const SLIPPERY_SLOPE_16_8: Self = Self(0x81);
    pub const SLIPPERY_SLOPE_0_4: Self = Self(0x8C);
    pub const SLIPPERY_SLOPE_BASE: Self = Self(0xBA);
    pub const SLIPPERY_BORDER_FLOOR: Self = Self(0xBB);
    pub const SLIPPERY_FLOOR: Self = Self(0xBE);

    pub fn is_solid_block(self) -> bool {
        matches!(
            self,
            Self::MUD
                | Self::TOP_MUD
                | Self::LAVA
                | Self::SOLID2
                | Self::SOLID3
                | Self::UNCLIMBABLE_SOLID
                | Self::LEFT_CONVEYOR
                | Self::RIGHT_CONVEYOR
                | Self::UP_SLOPE_BASE
                | Self::DOWN_SLOPE_BASE
                | Self::SOLID
                | Self::BREAKABLE
                | Self::NON_LETHAL_SPIKE
                | Self::LETHAL_SPIKE
                | Self::SLIPPERY_SLOPE_BASE
                | Self::SLIPPERY_BORDER_FLOOR
                | Self::SLIPPERY_FLOOR
                | Self::DOOR
        )
    }

    pub fn is_slope(self) -> bool {
        self.slope_heights().is_some()
    }

    pub fn is_water(self) -> bool {
        matches!(self, Self::WATER | Self::WATER_SURFACE)
    }

    pub fn to_flags(self) -> CollisionFlags {
        if self.is_solid_block() {
            return CollisionFlags::BLOCK;
        }
        if self.is_slope() {
            return CollisionFlags::SLOPE;
        }
        match self {
            Self::WATER => CollisionFlags::WATER,
            Self::WATER_SURFACE => CollisionFlags::WATER_SURFACE,
            Self::LADDER => CollisionFlags::LADDER,
            Self::TOP_LADDER => CollisionFlags::TOP_LADDER,
            _ => CollisionFlags::empty(),
        }
    }

    /// Surface height at the left and right edges of a slope, in
    /// [`SLOPE_UNIT`] space (0 is the map top).
    pub fn slope_heights(self) -> Option<(u8, u8)> {
        const HEIGHTS: [(u8, u8); 12] = [
            (16, 8),
            (8, 0),
            (8, 16),
            (0, 8),
            (16, 12),
            (12, 8),
            (8, 4),
            (4, 0),
            (12, 16),
            (8, 12),
            (4, 8),
            (0, 4),
        ];
        let index = match self.0 {
            0x01..=0x0C => self.0 - 0x01,
            // conveyor slopes reuse the gentle half of the table
            0x45..=0x4C => self.0 - 0x45 + 4,
            0x81..=0x8C => self.0 - 0x81,
            _ => return None,
        };
        Some(HEIGHTS[index as usize])
    }

    /// Solid triangle of a slope in map-local coordinates.
    pub fn slope_triangle(self, map_size: f32) -> Option<SlopeTriangle> {
        let (left, right) = self.slope_heights()?;
        let scale = map_size / SLOPE_UNIT;
        Some(SlopeTriangle::from_heights(
            left as f32 * scale,
            right as f32 * scale,
            map_size,
        ))
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CollisionFlags: u32 {
        const BLOCK = 1;
        const SLOPE = 2;
        const LADDER = 4;
        const TOP_LADDER = 8;
        const UNCLIMBABLE = 16;
        const WATER = 32;
        const WATER_SURFACE = 64;
    }
}

impl CollisionFlags {
    pub fn can_block_the_move(self, direction: Direction) -> bool {
        let horizontal = direction.intersects(Direction::BOTH_HORIZONTAL);
        self.contains(Self::BLOCK)
            || (horizontal && self.contains(Self::SLOPE))
            || (direction.contains(Direction::DOWN)
                && self.intersects(Self::TOP_LADDER | Self::SLOPE))
    }
}

/// Right triangle whose hypotenuse is a slope's walkable surface. The right
/// angle sits on the bottom edge at `origin`; the horizontal cathetus runs
/// `h_cathetus` along the bottom and the vertical one `v_cathetus` up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeTriangle {
    pub origin: Vec2,
    pub h_cathetus: f32,
    pub v_cathetus: f32,
}

impl SlopeTriangle {
    pub fn from_heights(left: f32, right: f32, map_size: f32) -> Self {
        if left < right {
            Self {
                origin: vec2(0.0, right),
                h_cathetus: map_size,
                v_cathetus: left - right,
            }
        } else {
            Self {
                origin: vec2(map_size, left),
                h_cathetus: -map_size,
                v_cathetus: right - left,
            }
        }
    }

    pub fn translate(self, offset: Vec2) -> Self {
        Self {
            origin: self.origin + offset,
            ..self
        }
    }

    pub fn left(&self) -> f32 {
        self.origin.x.min(self.origin.x + self.h_cathetus)
    }

    pub fn right(&self) -> f32 {
        self.origin.x.max(self.origin.x + self.h_cathetus)
    }

    /// y of the bottom edge.
    pub fn base(&self) -> f32 {
        self.origin.y
    }

    /// y of the hypotenuse at `x`, clamped to the triangle's span.
    pub fn surface_at(&self, x: f32) -> f32 {
        if self.h_cathetus == 0.0 {
            return self.origin.y;
        }
        let t = ((x - self.origin.x) / self.h_cathetus).clamp(0.0, 1.0);
        self.origin.y + self.v_cathetus * (1.0 - t)
    }

    /// True when the box and the triangle share a region of positive area.
    pub fn intersects(&self, rect: &Rect) -> bool {
        let a = rect.left().max(self.left());
        let b = rect.right().min(self.right());
        if a >= b || rect.top() >= self.base() {
            return false;
        }
        rect.bottom() > self.surface_at(a).min(self.surface_at(b))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapPlacement {
    pub cell: Cell,
    pub map: MapId,
}

impl MapPlacement {
    pub fn left_top(&self, layout: &Layout) -> Vec2 {
        layout.map_bounding_box(self.cell).point()
    }

    pub fn bounding_box(&self, layout: &Layout) -> Rect {
        layout.map_bounding_box(self.cell)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionPlacement {
    pub flag: CollisionFlags,
    pub placement: MapPlacement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_and_slope_classification() {
        assert!(CollisionData::SOLID.is_solid_block());
        assert!(CollisionData::DOOR.is_solid_block());
        assert!(!CollisionData::LADDER.is_solid_block());
        assert!(CollisionData::SLOPE_0_4.is_slope());
        assert!(CollisionData::RIGHT_CONVEYOR_SLOPE_0_4.is_slope());
        assert!(CollisionData(0x8A).is_slope());
        assert!(!CollisionData(0x0D).is_slope());
        assert!(!CollisionData(0x20).is_solid_block());
    }

    #[test]
    fn conveyor_slopes_share_heights_with_plain_ones() {
        assert_eq!(
            CollisionData::LEFT_CONVEYOR_SLOPE_16_12.slope_heights(),
            CollisionData::SLOPE_16_12.slope_heights()
        );
        assert_eq!(
            CollisionData::RIGHT_CONVEYOR_SLOPE_0_4.slope_heights(),
            Some((0, 4))
        );
    }

    #[test]
    fn flags_from_data() {
        assert_eq!(CollisionData::SOLID.to_flags(), CollisionFlags::BLOCK);
        assert_eq!(CollisionData::SLOPE_8_0.to_flags(), CollisionFlags::SLOPE);
        assert_eq!(CollisionData::TOP_LADDER.to_flags(), CollisionFlags::TOP_LADDER);
        assert_eq!(CollisionData::WATER.to_flags(), CollisionFlags::WATER);
        assert!(CollisionData::NONE.to_flags().is_empty());
    }

    #[test]
    fn rising_slope_triangle() {
        // left edge at 8, right edge at 16: surface falls toward the right
        let triangle = CollisionData::SLOPE_8_16.slope_triangle(16.0).unwrap();
        assert_eq!(triangle.origin, vec2(0.0, 16.0));
        assert_eq!(triangle.surface_at(0.0), 8.0);
        assert_eq!(triangle.surface_at(16.0), 16.0);
        assert_eq!(triangle.surface_at(8.0), 12.0);
    }

    #[test]
    fn descending_slope_triangle() {
        let triangle = CollisionData::SLOPE_16_8.slope_triangle(16.0).unwrap();
        assert_eq!(triangle.origin, vec2(16.0, 16.0));
        assert_eq!(triangle.left(), 0.0);
        assert_eq!(triangle.right(), 16.0);
        assert_eq!(triangle.surface_at(0.0), 16.0);
        assert_eq!(triangle.surface_at(16.0), 8.0);
    }

    #[test]
    fn triangle_box_intersection() {
        let triangle = CollisionData::SLOPE_16_8.slope_triangle(16.0).unwrap();
        // above the high end of the slope
        assert!(!triangle.intersects(&Rect::new(12.0, 0.0, 4.0, 7.0)));
        // dipping into the high end
        assert!(triangle.intersects(&Rect::new(12.0, 0.0, 4.0, 10.0)));
        // same depth over the low end stays clear
        assert!(!triangle.intersects(&Rect::new(0.0, 0.0, 4.0, 10.0)));
        // entirely below the map
        assert!(!triangle.intersects(&Rect::new(0.0, 16.0, 16.0, 4.0)));
    }

    #[test]
    fn triangle_scales_with_map_size() {
        let triangle = CollisionData::SLOPE_0_8.slope_triangle(32.0).unwrap();
        assert_eq!(triangle.surface_at(0.0), 0.0);
        assert_eq!(triangle.surface_at(32.0), 16.0);
    }

    #[test]
    fn blocking_rules() {
        let slope = CollisionFlags::SLOPE;
        assert!(slope.can_block_the_move(Direction::LEFT));
        assert!(slope.can_block_the_move(Direction::DOWN));
        assert!(!slope.can_block_the_move(Direction::UP));
        assert!(CollisionFlags::TOP_LADDER.can_block_the_move(Direction::DOWN));
        assert!(!CollisionFlags::LADDER.can_block_the_move(Direction::ALL));
        assert!(CollisionFlags::BLOCK.can_block_the_move(Direction::NONE));
    }
}
