use macroquad::prelude::*;

use crate::cell::Cell;
use crate::collision::CollisionData;
use crate::config::Layout;
use crate::render::PaintTarget;
use crate::tile::{TileId, TileSource, TileStore};
use crate::world::WorldError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(pub(crate) usize);

impl MapId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-cell orientation and layer of a placed tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileAttributes {
    pub flipped: bool,
    pub mirrored: bool,
    pub up_layer: bool,
}

impl TileAttributes {
    pub const UP_LAYER: Self = Self {
        flipped: false,
        mirrored: false,
        up_layer: true,
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct MapCell {
    tile: Option<TileId>,
    attributes: TileAttributes,
}

/// Square grid of tile references with one collision classification.
#[derive(Clone, Debug)]
pub struct Map {
    id: MapId,
    side: u32,
    cells: Vec<MapCell>,
    collision_data: CollisionData,
}

impl Map {
    pub(crate) fn new(id: MapId, side: u32, collision_data: CollisionData) -> Self {
        Self {
            id,
            side,
            cells: vec![MapCell::default(); (side * side) as usize],
            collision_data,
        }
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn collision_data(&self) -> CollisionData {
        self.collision_data
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.tile.is_none())
    }

    pub fn tile_at(&self, cell: Cell) -> Option<TileId> {
        let index = cell.index_in(self.side)?;
        self.cells[index].tile
    }

    pub fn attributes_at(&self, cell: Cell) -> Option<TileAttributes> {
        let index = cell.index_in(self.side)?;
        Some(self.cells[index].attributes)
    }

    /// Tile under a map-local position, `None` outside the map.
    pub fn get_tile_from(&self, layout: &Layout, pos: Vec2) -> Option<TileId> {
        self.tile_at(layout.tile_cell_from_pos(pos)?)
    }

    pub fn set_tile(
        &mut self,
        layout: &Layout,
        pos: Vec2,
        tile: Option<TileId>,
        attributes: TileAttributes,
    ) -> Result<(), WorldError> {
        let cell = layout
            .tile_cell_from_pos(pos)
            .ok_or(WorldError::NonFinitePosition)?;
        self.set_tile_at(cell, tile, attributes)
    }

    pub fn set_tile_at(
        &mut self,
        cell: Cell,
        tile: Option<TileId>,
        attributes: TileAttributes,
    ) -> Result<(), WorldError> {
        let index = cell.index_in(self.side).ok_or(WorldError::CellOutOfRange {
            cell,
            side: self.side,
        })?;
        self.cells[index] = MapCell { tile, attributes };
        Ok(())
    }

    /// Clears every cell holding `tile`. Returns how many were cleared.
    pub fn remove_tile(&mut self, tile: TileId) -> usize {
        let mut removed = 0;
        for cell in self.cells.iter_mut().filter(|cell| cell.tile == Some(tile)) {
            *cell = MapCell::default();
            removed += 1;
        }
        removed
    }

    /// Cuts a fresh tile for every cell from `source`, starting at `offset`.
    pub fn fill(
        &mut self,
        tiles: &mut TileStore,
        layout: &Layout,
        source: &dyn TileSource,
        offset: IVec2,
        attributes: TileAttributes,
    ) {
        let tile_size = layout.tile_size as i32;
        for col in 0..self.side as i32 {
            for row in 0..self.side as i32 {
                let origin = offset + ivec2(col * tile_size, row * tile_size);
                let tile = tiles.add(source.read_tile(origin, layout.tile_size));
                let index = (row * self.side as i32 + col) as usize;
                self.cells[index] = MapCell {
                    tile: Some(tile),
                    attributes,
                };
            }
        }
    }

    pub fn fill_with_tile(&mut self, tile: TileId, attributes: TileAttributes) {
        self.cells.fill(MapCell {
            tile: Some(tile),
            attributes,
        });
    }

    /// Places `tile` over a map-local box, truncated to whole tiles.
    pub fn fill_rectangle(
        &mut self,
        layout: &Layout,
        rect: Rect,
        tile: TileId,
        attributes: TileAttributes,
    ) -> Result<(), WorldError> {
        let tile_size = layout.tile_size as f32;
        let col = (rect.x / tile_size) as i32;
        let row = (rect.y / tile_size) as i32;
        let cols = (rect.w / tile_size) as i32;
        let rows = (rect.h / tile_size) as i32;

        for c in 0..cols {
            for r in 0..rows {
                self.set_tile_at(Cell::new(row + r, col + c), Some(tile), attributes)?;
            }
        }
        Ok(())
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Cell, TileId)> + '_ {
        let side = self.side as i32;
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            let index = index as i32;
            cell.tile.map(|tile| (Cell::new(index / side, index % side), tile))
        })
    }

    fn paint_layer(
        &self,
        tiles: &TileStore,
        layout: &Layout,
        target: &mut dyn PaintTarget,
        offset: Vec2,
        up_layer: bool,
    ) {
        let tile_size = layout.tile_size as f32;
        for col in 0..self.side {
            for row in 0..self.side {
                let cell = self.cells[(row * self.side + col) as usize];
                if cell.attributes.up_layer != up_layer {
                    continue;
                }
                let Some(tile) = cell.tile.and_then(|id| tiles.get(id)) else {
                    continue;
                };
                let dest = Rect::new(
                    offset.x + col as f32 * tile_size,
                    offset.y + row as f32 * tile_size,
                    tile_size,
                    tile_size,
                );
                target.draw_tile(tile, dest, cell.attributes);
            }
        }
    }

    pub fn paint_down_layer(
        &self,
        tiles: &TileStore,
        layout: &Layout,
        target: &mut dyn PaintTarget,
        offset: Vec2,
    ) {
        self.paint_layer(tiles, layout, target, offset, false);
    }

    pub fn paint_up_layer(
        &self,
        tiles: &TileStore,
        layout: &Layout,
        target: &mut dyn PaintTarget,
        offset: Vec2,
    ) {
        self.paint_layer(tiles, layout, target, offset, true);

        if self.collision_data != CollisionData::NONE {
            let map_size = layout.map_size() as f32;
            target.draw_map_bounds(
                Rect::new(offset.x, offset.y, map_size, map_size),
                self.collision_data,
            );
        }
    }
}

/// Arena of maps, same id policy as [`TileStore`].
#[derive(Default)]
pub struct MapStore {
    maps: Vec<Option<Map>>,
}

impl MapStore {
    pub fn add(&mut self, side: u32, collision_data: CollisionData) -> MapId {
        let id = MapId(self.maps.len());
        self.maps.push(Some(Map::new(id, side, collision_data)));
        id
    }

    pub fn get(&self, id: MapId) -> Option<&Map> {
        self.maps.get(id.0).and_then(|map| map.as_ref())
    }

    pub fn get_mut(&mut self, id: MapId) -> Option<&mut Map> {
        self.maps.get_mut(id.0).and_then(|map| map.as_mut())
    }

    pub fn remove(&mut self, id: MapId) -> Option<Map> {
        self.maps.get_mut(id.0).and_then(|map| map.take())
    }

    pub fn len(&self) -> usize {
        self.maps.iter().filter(|map| map.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Map> {
        self.maps.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Map> {
        self.maps.iter_mut().flatten()
    }
}
