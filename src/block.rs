use macroquad::prelude::*;

use crate::cell::Cell;
use crate::collision::CollisionData;
use crate::map::{MapId, TileAttributes};
use crate::render::PaintTarget;
use crate::tile::{TileId, TileSource};
use crate::world::{WorldContext, WorldError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Square grid of optional map references. Positions handed to a block are
/// block-local pixels.
#[derive(Clone, Debug)]
pub struct Block {
    id: BlockId,
    side: u32,
    maps: Vec<Option<MapId>>,
}

impl Block {
    pub fn new(id: BlockId, side: u32) -> Self {
        Self {
            id,
            side,
            maps: vec![None; (side * side) as usize],
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn get(&self, cell: Cell) -> Option<MapId> {
        let index = cell.index_in(self.side)?;
        self.maps[index]
    }

    pub fn set(&mut self, cell: Cell, map: Option<MapId>) -> Result<(), WorldError> {
        let index = cell.index_in(self.side).ok_or(WorldError::CellOutOfRange {
            cell,
            side: self.side,
        })?;
        self.maps[index] = map;
        Ok(())
    }

    /// Occupied cells in storage order.
    pub fn maps(&self) -> impl Iterator<Item = (Cell, MapId)> + '_ {
        let side = self.side as i32;
        self.maps.iter().enumerate().filter_map(move |(index, map)| {
            let index = index as i32;
            map.map(|map| (Cell::new(index / side, index % side), map))
        })
    }

    fn map_left_top<W: WorldContext + ?Sized>(ctx: &W, cell: Cell) -> Vec2 {
        ctx.layout().map_bounding_box(cell).point()
    }

    pub fn get_map_from<W: WorldContext + ?Sized>(&self, ctx: &W, pos: Vec2) -> Option<MapId> {
        self.get(ctx.layout().map_cell_from_pos(pos)?)
    }

    pub fn get_tile_from<W: WorldContext + ?Sized>(&self, ctx: &W, pos: Vec2) -> Option<TileId> {
        let cell = ctx.layout().map_cell_from_pos(pos)?;
        let map = ctx.map(self.get(cell)?)?;
        map.get_tile_from(ctx.layout(), pos - Self::map_left_top(ctx, cell))
    }

    /// Writes `tile` at `pos`, creating an empty map first when the cell
    /// has none. Returns the map that received the tile.
    pub fn set_tile<W: WorldContext + ?Sized>(
        &mut self,
        ctx: &mut W,
        pos: Vec2,
        tile: TileId,
    ) -> Result<MapId, WorldError> {
        let cell = ctx
            .layout()
            .map_cell_from_pos(pos)
            .ok_or(WorldError::NonFinitePosition)?;
        if cell.index_in(self.side).is_none() {
            return Err(WorldError::CellOutOfRange {
                cell,
                side: self.side,
            });
        }

        let map_id = match self.get(cell) {
            Some(map_id) => map_id,
            None => {
                let map_id = ctx.add_map(CollisionData::NONE);
                log::debug!("block {:?}: created map {:?} at {cell}", self.id, map_id);
                self.set(cell, Some(map_id))?;
                map_id
            }
        };

        let local = pos - Self::map_left_top(ctx, cell);
        let layout = *ctx.layout();
        let map = ctx.map_mut(map_id).ok_or(WorldError::UnknownMap(map_id))?;
        map.set_tile(&layout, local, Some(tile), TileAttributes::default())?;
        Ok(map_id)
    }

    pub fn set_map<W: WorldContext + ?Sized>(
        &mut self,
        ctx: &W,
        pos: Vec2,
        map: Option<MapId>,
    ) -> Result<(), WorldError> {
        let cell = ctx
            .layout()
            .map_cell_from_pos(pos)
            .ok_or(WorldError::NonFinitePosition)?;
        self.set(cell, map)
    }

    /// Clears every cell referencing `map`. `None` is a no-op.
    pub fn remove_map(&mut self, map: Option<MapId>) -> usize {
        let Some(map) = map else {
            return 0;
        };
        let mut removed = 0;
        for slot in self.maps.iter_mut().filter(|slot| **slot == Some(map)) {
            *slot = None;
            removed += 1;
        }
        removed
    }

    /// Replaces every cell with a freshly cut map. Previous occupants are
    /// dropped from the block but stay registered in the world.
    pub fn fill<W: WorldContext + ?Sized>(
        &mut self,
        ctx: &mut W,
        source: &dyn TileSource,
        offset: IVec2,
        collision_data: CollisionData,
        attributes: TileAttributes,
    ) {
        let map_size = ctx.layout().map_size() as i32;
        for col in 0..self.side as i32 {
            for row in 0..self.side as i32 {
                let map_id = ctx.add_map(collision_data);
                let origin = offset + ivec2(col * map_size, row * map_size);
                ctx.fill_map(map_id, source, origin, attributes);
                self.maps[(row * self.side as i32 + col) as usize] = Some(map_id);
            }
        }
    }

    pub fn fill_rectangle_with_tile<W: WorldContext + ?Sized>(
        &mut self,
        ctx: &mut W,
        rect: Rect,
        tile: TileId,
    ) -> Result<(), WorldError> {
        let tile_size = ctx.layout().tile_size as f32;
        let col = (rect.x / tile_size) as i32;
        let row = (rect.y / tile_size) as i32;
        let cols = (rect.w / tile_size) as i32;
        let rows = (rect.h / tile_size) as i32;

        for c in 0..cols {
            for r in 0..rows {
                let pos = vec2((col + c) as f32 * tile_size, (row + r) as f32 * tile_size);
                self.set_tile(ctx, pos, tile)?;
            }
        }
        Ok(())
    }

    pub fn fill_rectangle_with_map<W: WorldContext + ?Sized>(
        &mut self,
        ctx: &W,
        rect: Rect,
        map: MapId,
    ) -> Result<(), WorldError> {
        let map_size = ctx.layout().map_size() as f32;
        let col = (rect.x / map_size) as i32;
        let row = (rect.y / map_size) as i32;
        let cols = (rect.w / map_size) as i32;
        let rows = (rect.h / map_size) as i32;

        for c in 0..cols {
            for r in 0..rows {
                self.set(Cell::new(row + r, col + c), Some(map))?;
            }
        }
        Ok(())
    }

    fn paint_layer<W: WorldContext + ?Sized>(
        &self,
        ctx: &W,
        target: &mut dyn PaintTarget,
        offset: Vec2,
        up_layer: bool,
    ) {
        let layout = ctx.layout();
        let map_size = layout.map_size() as f32;
        for col in 0..self.side {
            for row in 0..self.side {
                let map_offset = offset + vec2(col as f32 * map_size, row as f32 * map_size);
                let map = self.maps[(row * self.side + col) as usize].and_then(|id| ctx.map(id));
                match map {
                    Some(map) if up_layer => {
                        map.paint_up_layer(ctx.tiles(), layout, target, map_offset)
                    }
                    Some(map) => map.paint_down_layer(ctx.tiles(), layout, target, map_offset),
                    None => target.clear_rect(Rect::new(
                        map_offset.x,
                        map_offset.y,
                        map_size,
                        map_size,
                    )),
                }
            }
        }
    }

    /// Paints tiles meant to sit behind entities. Empty cells are cleared
    /// to transparent here and in the up pass.
    pub fn paint_down_layer<W: WorldContext + ?Sized>(
        &self,
        ctx: &W,
        target: &mut dyn PaintTarget,
        offset: Vec2,
    ) {
        self.paint_layer(ctx, target, offset, false);
    }

    pub fn paint_up_layer<W: WorldContext + ?Sized>(
        &self,
        ctx: &W,
        target: &mut dyn PaintTarget,
        offset: Vec2,
    ) {
        self.paint_layer(ctx, target, offset, true);
    }
}
