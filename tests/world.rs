use macroquad::prelude::*;

use mmx_engine::cell::Cell;
use mmx_engine::collision::{CollisionData, CollisionFlags};
use mmx_engine::config::Layout;
use mmx_engine::direction::Direction;
use mmx_engine::world::{World, WorldContext};

fn small_world() -> World {
    World::new(Layout::default(), 2, 2)
}

#[test]
fn tile_round_trip_through_a_fresh_block() {
    let layout = Layout {
        tile_size: 16,
        side_tiles_per_map: 16,
        side_maps_per_block: 8,
    };
    let mut world = World::new(layout, 1, 1);
    let tile7 = world.add_tile(vec![7; 16 * 16 * 4]);

    let map = world.set_tile(vec2(300.0, 10.0), tile7).unwrap();
    assert_eq!(world.get_tile_from(vec2(300.0, 10.0)), Some(tile7));
    assert_eq!(world.get_map_from(vec2(300.0, 10.0)), Some(map));

    let block = world.block(world.block_at(Cell::new(0, 0)).unwrap()).unwrap();
    assert_eq!(block.get(Cell::new(0, 1)), Some(map));
    let local = layout.tile_cell_from_pos(vec2(44.0, 10.0)).unwrap();
    assert_eq!(world.map(map).unwrap().tile_at(local), Some(tile7));
}

#[test]
fn queries_outside_the_world_find_nothing() {
    let mut world = small_world();
    let tile = world.add_tile(Vec::new());
    world.set_tile(vec2(0.0, 0.0), tile).unwrap();

    for pos in [vec2(-40.0, 0.0), vec2(64.0, 0.0), vec2(0.0, 64.0), vec2(1e6, -1e6)] {
        assert_eq!(world.get_tile_from(pos), None);
        assert_eq!(world.get_map_from(pos), None);
        assert_eq!(world.get_block_from(pos), None);
    }
    assert!(world.set_tile(vec2(64.0, 0.0), tile).is_err());
}

#[test]
fn shared_map_is_removed_from_every_cell() {
    let mut world = small_world();
    let block = world.add_block();
    let map = world.add_map(CollisionData::SOLID);
    let other = world.add_map(CollisionData::NONE);

    let (block_ref, registry) = world.block_mut(block).unwrap();
    for pos in [vec2(0.0, 0.0), vec2(16.0, 0.0), vec2(16.0, 16.0)] {
        block_ref.set_map(&*registry, pos, Some(map)).unwrap();
    }
    block_ref.set_map(&*registry, vec2(0.0, 16.0), Some(other)).unwrap();

    assert_eq!(block_ref.remove_map(Some(map)), 3);
    assert_eq!(block_ref.remove_map(Some(map)), 0);
    assert_eq!(block_ref.remove_map(None), 0);
    assert_eq!(block_ref.maps().collect::<Vec<_>>(), vec![(Cell::new(1, 0), other)]);
}

#[test]
fn fill_rectangle_sets_exactly_the_covered_tiles() {
    let mut world = small_world();
    let block = world.add_block();
    let tile = world.add_tile(Vec::new());

    let (block_ref, registry) = world.block_mut(block).unwrap();
    block_ref
        .fill_rectangle_with_tile(registry, Rect::new(8.0, 0.0, 20.0, 17.0), tile)
        .unwrap();

    let mut placed = 0;
    for (cell, map) in block_ref.maps() {
        let map = registry.map(map).unwrap();
        placed += map.tiles().count();
        assert!(cell.row == 0, "rows below the truncated extent stay empty");
    }
    // 20x17 truncates to 2x2 tiles
    assert_eq!(placed, 4);
}

#[test]
fn fill_replaces_every_map() {
    let mut world = small_world();
    let image = Image::gen_image_color(32, 32, Color::new(0.0, 1.0, 0.0, 1.0));
    let block = world.add_block_from(&image, CollisionData::SOLID);
    let before: Vec<_> = world.block(block).unwrap().maps().collect();
    assert_eq!(before.len(), 4);

    let (block_ref, registry) = world.block_mut(block).unwrap();
    block_ref.fill(
        registry,
        &image,
        IVec2::ZERO,
        CollisionData::NONE,
        Default::default(),
    );
    let after: Vec<_> = block_ref.maps().collect();
    assert_eq!(after.len(), 4);
    for ((_, old), (_, new)) in before.iter().zip(&after) {
        assert_ne!(old, new);
    }
    assert_eq!(world.map_count(), 8);
}

#[test]
fn collision_query_reports_solid_ground_under_a_box() {
    let mut world = small_world();
    world
        .add_rectangle(Rect::new(0.0, 48.0, 64.0, 16.0), WHITE, CollisionData::SOLID)
        .unwrap();
    world
        .add_rectangle(Rect::new(0.0, 0.0, 16.0, 16.0), WHITE, CollisionData::LADDER)
        .unwrap();

    let standing = Rect::new(28.0, 40.0, 8.0, 8.0);
    assert!(world.get_collision_flags(standing, CollisionFlags::empty(), true).flags.is_empty());

    let sunk = standing.offset(vec2(0.0, 2.0));
    let query = world.get_collision_flags(sunk, CollisionFlags::empty(), true);
    assert_eq!(query.flags, CollisionFlags::BLOCK);
    assert_eq!(query.placements.len(), 2);

    let climbing = Rect::new(4.0, 4.0, 8.0, 8.0);
    let query = world.get_collision_flags(climbing, CollisionFlags::empty(), true);
    assert!(query.flags.contains(CollisionFlags::LADDER));
    let ignored = world.get_collision_flags(climbing, CollisionFlags::LADDER, true);
    assert!(!ignored.flags.contains(CollisionFlags::LADDER));
}

#[test]
fn direction_integer_bijection() {
    for direction in [
        Direction::NONE,
        Direction::LEFT,
        Direction::UP,
        Direction::RIGHT,
        Direction::DOWN,
    ] {
        let value = direction.to_int().unwrap();
        assert_eq!(Direction::from_int(value).unwrap(), direction);
    }
    assert!(Direction::from_int(3).is_err());
    assert!(Direction::from_int(-1).is_err());
    assert!(Direction::LEFT_UP.to_int().is_err());
}
