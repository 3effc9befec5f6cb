use macroquad::prelude::*;
use std::collections::HashMap;

use crate::collision::CollisionData;
use crate::entity::EntityList;
use crate::helpers::draw_hitbox;
use crate::map::TileAttributes;
use crate::tile::{Tile, TileId};
use crate::world::World;

/// A sprite frame ready to be drawn, in view coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDraw<'a> {
    pub name: &'a str,
    pub sequence: &'a str,
    pub frame: usize,
    pub dest: Rect,
    pub mirrored: bool,
}

/// Where world and entity painting ends up. Painting code only emits
/// rectangles, so tests can record calls instead of touching the GPU.
pub trait PaintTarget {
    fn draw_tile(&mut self, tile: &Tile, dest: Rect, attributes: TileAttributes);
    fn clear_rect(&mut self, rect: Rect);
    fn draw_sprite(&mut self, sprite: &SpriteDraw);

    fn draw_map_bounds(&mut self, _rect: Rect, _collision_data: CollisionData) {}
}

/// Background, down layer, then entities, then up layer.
pub fn render_frame(world: &World, entities: &EntityList, target: &mut dyn PaintTarget, view: Rect) {
    world.paint_background(target, view);
    world.paint_down_layer(target, view);
    entities.paint(target, view);
    world.paint_up_layer(target, view);
}

/// Draws straight to the current macroquad render target. Tile textures
/// are cached per tile and re-uploaded when the tile's revision moves.
pub struct MacroquadTarget {
    textures: HashMap<TileId, (u64, Texture2D)>,
    tile_size: u32,
    pub debug_map_bounds: bool,
}

impl MacroquadTarget {
    pub fn new(tile_size: u32) -> Self {
        Self {
            textures: HashMap::new(),
            tile_size,
            debug_map_bounds: false,
        }
    }

    fn texture_for(&mut self, tile: &Tile) -> Option<&Texture2D> {
        let side = self.tile_size as usize;
        if tile.data().len() != side * side * 4 {
            log::warn!("tile {:?} has {} bytes, expected {}", tile.id(), tile.data().len(), side * side * 4);
            return None;
        }
        let side = self.tile_size as u16;
        let entry = self
            .textures
            .entry(tile.id())
            .and_modify(|(revision, texture)| {
                if *revision != tile.revision() {
                    *texture = upload(side, tile.data());
                    *revision = tile.revision();
                }
            })
            .or_insert_with(|| (tile.revision(), upload(side, tile.data())));
        Some(&entry.1)
    }
}

fn upload(side: u16, data: &[u8]) -> Texture2D {
    let texture = Texture2D::from_rgba8(side, side, data);
    texture.set_filter(FilterMode::Nearest);
    texture
}

impl PaintTarget for MacroquadTarget {
    fn draw_tile(&mut self, tile: &Tile, dest: Rect, attributes: TileAttributes) {
        let Some(texture) = self.texture_for(tile) else {
            return;
        };
        draw_texture_ex(
            texture,
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(dest.w, dest.h)),
                flip_x: attributes.mirrored,
                flip_y: attributes.flipped,
                ..Default::default()
            },
        );
    }

    // Layers land on a frame already cleared by the caller, so a
    // transparent clear leaves nothing to draw.
    fn clear_rect(&mut self, _rect: Rect) {}

    fn draw_sprite(&mut self, sprite: &SpriteDraw) {
        let color = match sprite.name {
            "lemon" => YELLOW,
            "charging" => SKYBLUE,
            _ => MAGENTA,
        };
        let dest = sprite.dest;
        draw_rectangle(dest.x, dest.y, dest.w, dest.h, color);
    }

    fn draw_map_bounds(&mut self, rect: Rect, collision_data: CollisionData) {
        if !self.debug_map_bounds {
            return;
        }
        let color = if collision_data.is_slope() { ORANGE } else { GREEN };
        draw_hitbox(rect, Vec2::ZERO, color);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    pub(crate) enum Call {
        Tile(TileId, Rect),
        Clear(Rect),
        Sprite(String),
        MapBounds(Rect, CollisionData),
    }

    #[derive(Default)]
    pub(crate) struct Recorder {
        pub calls: Vec<Call>,
    }

    impl PaintTarget for Recorder {
        fn draw_tile(&mut self, tile: &Tile, dest: Rect, _attributes: TileAttributes) {
            self.calls.push(Call::Tile(tile.id(), dest));
        }

        fn clear_rect(&mut self, rect: Rect) {
            self.calls.push(Call::Clear(rect));
        }

        fn draw_sprite(&mut self, sprite: &SpriteDraw) {
            self.calls.push(Call::Sprite(sprite.sequence.to_string()));
        }

        fn draw_map_bounds(&mut self, rect: Rect, collision_data: CollisionData) {
            self.calls.push(Call::MapBounds(rect, collision_data));
        }
    }

    #[test]
    fn frame_paints_background_down_entities_up() {
        use crate::config::Layout;

        let layout = Layout {
            tile_size: 8,
            side_tiles_per_map: 1,
            side_maps_per_block: 1,
        };
        let mut world = World::new(layout, 1, 2);
        let down = world.add_tile(vec![0; 8 * 8 * 4]);
        let up = world.add_tile(vec![0; 8 * 8 * 4]);
        world.set_tile(vec2(0.0, 0.0), down).unwrap();
        let map = world.set_tile(vec2(8.0, 0.0), up).unwrap();
        world
            .map_mut(map)
            .unwrap()
            .set_tile_at(crate::cell::Cell::new(0, 0), Some(up), TileAttributes::UP_LAYER)
            .unwrap();
        let back = world.add_tile(vec![0; 8 * 8 * 4]);
        let scenery = world.add_block();
        let (block, registry) = world.block_mut(scenery).unwrap();
        block.set_tile(registry, vec2(0.0, 0.0), back).unwrap();
        world.set_background_block(vec2(8.0, 0.0), Some(scenery)).unwrap();

        let mut entities = EntityList::default();
        entities.spawn_charging_effect(None, vec2(4.0, 4.0));

        let mut recorder = Recorder::default();
        render_frame(&world, &entities, &mut recorder, Rect::new(0.0, 0.0, 16.0, 8.0));
        assert_eq!(
            recorder.calls,
            vec![
                Call::Tile(back, Rect::new(8.0, 0.0, 8.0, 8.0)),
                Call::Tile(down, Rect::new(0.0, 0.0, 8.0, 8.0)),
                Call::Sprite("Level1".to_string()),
                Call::Tile(up, Rect::new(8.0, 0.0, 8.0, 8.0)),
            ]
        );
    }
}
