use macroquad::prelude::*;

use crate::collision::CollisionData;
use crate::world::{World, WorldError};

/// Checkerboard used as the demo level's background art.
pub fn backdrop(size: u16) -> Image {
    let mut image = Image::gen_image_color(size, size, Color::from_rgba(24, 32, 64, 255));
    let check = (size / 4).max(1) as u32;
    for y in 0..size as u32 {
        for x in 0..size as u32 {
            if (x / check + y / check) % 2 == 0 {
                image.set_pixel(x, y, Color::from_rgba(32, 48, 96, 255));
            }
        }
    }
    image
}

/// Demo level: a tiled backdrop behind a floor, a right wall and a ledge.
/// The backdrop lives in the background grid; terrain gets its own
/// foreground blocks.
pub fn build_level(world: &mut World) -> Result<(), WorldError> {
    let layout = *world.layout();
    let bounds = world.bounds();
    let map_size = layout.map_size() as f32;

    let scenery = world.add_block_from(&backdrop(layout.block_size() as u16), CollisionData::NONE);
    world.fill_background_with_block(bounds, scenery)?;

    let floor = Rect::new(0.0, bounds.bottom() - map_size * 2.0, bounds.w, map_size * 2.0);
    let wall = Rect::new(bounds.right() - map_size, 0.0, map_size, bounds.h);
    let ledge = Rect::new(map_size * 10.0, bounds.bottom() - map_size * 5.0, map_size * 6.0, map_size);
    for (rect, color) in [(floor, DARKGRAY), (wall, GRAY), (ledge, BROWN)] {
        world.add_rectangle(rect, color, CollisionData::SOLID)?;
    }
    log::info!(
        "level ready: {} tiles, {} maps, {} blocks",
        world.tile_count(),
        world.map_count(),
        world.block_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::collision::CollisionFlags;
    use crate::config::Layout;

    fn level() -> World {
        let mut world = World::new(Layout::default(), 7, 24);
        build_level(&mut world).unwrap();
        world
    }

    fn flags_at(world: &World, pos: Vec2) -> CollisionFlags {
        world
            .get_collision_flags(Rect::new(pos.x, pos.y, 8.0, 8.0), CollisionFlags::empty(), false)
            .flags
    }

    #[test]
    fn sky_stays_open() {
        let world = level();
        assert!(flags_at(&world, vec2(40.0, 40.0)).is_empty());
        assert!(flags_at(&world, vec2(600.0, 100.0)).is_empty());
        assert_eq!(world.get_map_from(vec2(40.0, 40.0)), None);
    }

    #[test]
    fn terrain_is_solid() {
        let world = level();
        let bounds = world.bounds();
        assert_eq!(flags_at(&world, vec2(40.0, bounds.bottom() - 16.0)), CollisionFlags::BLOCK);
        assert_eq!(flags_at(&world, vec2(bounds.right() - 8.0, 40.0)), CollisionFlags::BLOCK);
        // ledge spans maps 10..16 one row above the gap over the floor
        assert_eq!(flags_at(&world, vec2(168.0, bounds.bottom() - 80.0)), CollisionFlags::BLOCK);
    }

    #[test]
    fn backdrop_fills_the_background_grid() {
        let world = level();
        let scenery = world.background_block_at(Cell::new(0, 0));
        assert!(scenery.is_some());
        for row in 0..world.block_rows() as i32 {
            for col in 0..world.block_cols() as i32 {
                assert_eq!(world.background_block_at(Cell::new(row, col)), scenery);
                assert_ne!(world.block_at(Cell::new(row, col)), scenery);
            }
        }
    }
}
