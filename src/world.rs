use macroquad::prelude::*;
use thiserror::Error;

use crate::block::{Block, BlockId};
use crate::cell::Cell;
use crate::collision::{CollisionData, CollisionFlags, CollisionPlacement, MapPlacement, SlopeTriangle};
use crate::config::{EngineConfig, Layout};
use crate::helpers::intersection_area;
use crate::map::{Map, MapId, MapStore, TileAttributes};
use crate::render::PaintTarget;
use crate::tile::{Tile, TileId, TileSource, TileStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("cell {cell} is outside a {side}x{side} grid")]
    CellOutOfRange { cell: Cell, side: u32 },
    #[error("block cell {0} is outside the world")]
    OutsideWorld(Cell),
    #[error("unknown tile {0:?}")]
    UnknownTile(TileId),
    #[error("unknown map {0:?}")]
    UnknownMap(MapId),
    #[error("unknown block {0:?}")]
    UnknownBlock(BlockId),
    #[error("position is not finite")]
    NonFinitePosition,
}

/// What blocks may ask of the world that owns them.
pub trait WorldContext {
    fn layout(&self) -> &Layout;
    fn tiles(&self) -> &TileStore;
    fn map(&self, id: MapId) -> Option<&Map>;
    fn map_mut(&mut self, id: MapId) -> Option<&mut Map>;
    fn add_map(&mut self, collision_data: CollisionData) -> MapId;
    fn fill_map(
        &mut self,
        id: MapId,
        source: &dyn TileSource,
        offset: IVec2,
        attributes: TileAttributes,
    );
}

/// Tile and map arenas plus the grid geometry they were cut for.
pub struct Registry {
    layout: Layout,
    tiles: TileStore,
    maps: MapStore,
}

impl Registry {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            tiles: TileStore::default(),
            maps: MapStore::default(),
        }
    }

    pub fn add_tile(&mut self, data: Vec<u8>) -> TileId {
        self.tiles.add(data)
    }

    pub fn add_tile_from(&mut self, source: &dyn TileSource, offset: IVec2) -> TileId {
        self.tiles.add(source.read_tile(offset, self.layout.tile_size))
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id)
    }

    /// Recuts an existing tile from `source`. Every cell showing it changes.
    pub fn redraw_tile(
        &mut self,
        id: TileId,
        source: &dyn TileSource,
        offset: IVec2,
    ) -> Result<(), WorldError> {
        let tile_size = self.layout.tile_size;
        let tile = self.tiles.get_mut(id).ok_or(WorldError::UnknownTile(id))?;
        tile.set_pixels(source, offset, tile_size);
        Ok(())
    }

    pub fn maps(&self) -> &MapStore {
        &self.maps
    }

    /// Drops the tile and clears it from every map.
    pub fn remove_tile(&mut self, id: TileId) -> Result<(), WorldError> {
        self.tiles.remove(id).ok_or(WorldError::UnknownTile(id))?;
        let cleared: usize = self.maps.iter_mut().map(|map| map.remove_tile(id)).sum();
        log::debug!("removed tile {id:?} from {cleared} cells");
        Ok(())
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.maps.clear();
    }
}

impl WorldContext for Registry {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn tiles(&self) -> &TileStore {
        &self.tiles
    }

    fn map(&self, id: MapId) -> Option<&Map> {
        self.maps.get(id)
    }

    fn map_mut(&mut self, id: MapId) -> Option<&mut Map> {
        self.maps.get_mut(id)
    }

    fn add_map(&mut self, collision_data: CollisionData) -> MapId {
        self.maps.add(self.layout.side_tiles_per_map, collision_data)
    }

    fn fill_map(
        &mut self,
        id: MapId,
        source: &dyn TileSource,
        offset: IVec2,
        attributes: TileAttributes,
    ) {
        if let Some(map) = self.maps.get_mut(id) {
            map.fill(&mut self.tiles, &self.layout, source, offset, attributes);
        }
    }
}

/// Result of [`World::get_collision_flags`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionQuery {
    pub flags: CollisionFlags,
    pub placements: Vec<CollisionPlacement>,
    /// Last slope touched, in world coordinates.
    pub slope: Option<SlopeTriangle>,
}

/// Owner of every tile, map and block, and the two grids blocks are placed
/// on. The foreground grid collides and paints; the background grid only
/// paints, behind everything else.
pub struct World {
    registry: Registry,
    blocks: Vec<Option<Block>>,
    block_rows: u32,
    block_cols: u32,
    grid: Vec<Option<BlockId>>,
    background: Vec<Option<BlockId>>,
}

impl World {
    pub fn new(layout: Layout, block_rows: u32, block_cols: u32) -> Self {
        Self {
            registry: Registry::new(layout),
            blocks: Vec::new(),
            block_rows,
            block_cols,
            grid: vec![None; (block_rows * block_cols) as usize],
            background: vec![None; (block_rows * block_cols) as usize],
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.layout, config.block_rows, config.block_cols)
    }

    pub fn layout(&self) -> &Layout {
        &self.registry.layout
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn block_rows(&self) -> u32 {
        self.block_rows
    }

    pub fn block_cols(&self) -> u32 {
        self.block_cols
    }

    pub fn map_rows(&self) -> u32 {
        self.block_rows * self.layout().side_maps_per_block
    }

    pub fn map_cols(&self) -> u32 {
        self.block_cols * self.layout().side_maps_per_block
    }

    pub fn bounds(&self) -> Rect {
        let block_size = self.layout().block_size() as f32;
        Rect::new(
            0.0,
            0.0,
            self.block_cols as f32 * block_size,
            self.block_rows as f32 * block_size,
        )
    }

    // Factories

    pub fn add_tile(&mut self, data: Vec<u8>) -> TileId {
        self.registry.add_tile(data)
    }

    pub fn add_tile_from(&mut self, source: &dyn TileSource, offset: IVec2) -> TileId {
        self.registry.add_tile_from(source, offset)
    }

    pub fn add_tile_color(&mut self, color: Color) -> TileId {
        let id = self.registry.add_tile(Vec::new());
        let tile_size = self.layout().tile_size;
        if let Some(tile) = self.registry.tile_mut(id) {
            tile.fill_color(color, tile_size);
        }
        id
    }

    pub fn add_map(&mut self, collision_data: CollisionData) -> MapId {
        self.registry.add_map(collision_data)
    }

    /// Map whose every cell shares one tile of a single color.
    pub fn add_map_color(&mut self, color: Color, collision_data: CollisionData) -> MapId {
        let tile = self.add_tile_color(color);
        let id = self.registry.add_map(collision_data);
        if let Some(map) = self.registry.map_mut(id) {
            map.fill_with_tile(tile, TileAttributes::default());
        }
        id
    }

    pub fn add_map_from(
        &mut self,
        source: &dyn TileSource,
        offset: IVec2,
        collision_data: CollisionData,
    ) -> MapId {
        let id = self.registry.add_map(collision_data);
        self.registry
            .fill_map(id, source, offset, TileAttributes::default());
        id
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks
            .push(Some(Block::new(id, self.layout().side_maps_per_block)));
        id
    }

    pub fn add_block_from(&mut self, source: &dyn TileSource, collision_data: CollisionData) -> BlockId {
        let id = self.add_block();
        if let Some(block) = self.blocks[id.0].as_mut() {
            block.fill(
                &mut self.registry,
                source,
                IVec2::ZERO,
                collision_data,
                TileAttributes::default(),
            );
        }
        id
    }

    // Lookups

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.registry.tile(id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.registry.tile_mut(id)
    }

    pub fn redraw_tile(
        &mut self,
        id: TileId,
        source: &dyn TileSource,
        offset: IVec2,
    ) -> Result<(), WorldError> {
        self.registry.redraw_tile(id, source, offset)
    }

    pub fn map(&self, id: MapId) -> Option<&Map> {
        self.registry.map(id)
    }

    pub fn map_mut(&mut self, id: MapId) -> Option<&mut Map> {
        self.registry.map_mut(id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0).and_then(|block| block.as_ref())
    }

    /// Mutable block together with the registry it resolves maps against.
    pub fn block_mut(&mut self, id: BlockId) -> Option<(&mut Block, &mut Registry)> {
        let block = self.blocks.get_mut(id.0)?.as_mut()?;
        Some((block, &mut self.registry))
    }

    pub fn tile_count(&self) -> usize {
        self.registry.tiles.len()
    }

    pub fn map_count(&self) -> usize {
        self.registry.maps.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.iter().filter(|block| block.is_some()).count()
    }

    // Positional queries

    fn grid_index(&self, cell: Cell) -> Option<usize> {
        if cell.row < 0
            || cell.col < 0
            || cell.row >= self.block_rows as i32
            || cell.col >= self.block_cols as i32
        {
            return None;
        }
        Some((cell.row * self.block_cols as i32 + cell.col) as usize)
    }

    /// Grid slot under `pos` for a write.
    fn slot(&self, pos: Vec2) -> Result<(Cell, usize), WorldError> {
        let cell = self
            .layout()
            .block_cell_from_pos(pos)
            .ok_or(WorldError::NonFinitePosition)?;
        let index = self.grid_index(cell).ok_or(WorldError::OutsideWorld(cell))?;
        Ok((cell, index))
    }

    pub fn block_at(&self, cell: Cell) -> Option<BlockId> {
        self.grid[self.grid_index(cell)?]
    }

    pub fn background_block_at(&self, cell: Cell) -> Option<BlockId> {
        self.background[self.grid_index(cell)?]
    }

    pub fn get_block_from(&self, pos: Vec2) -> Option<BlockId> {
        self.block_at(self.layout().block_cell_from_pos(pos)?)
    }

    fn locate(&self, pos: Vec2) -> Option<(&Block, Vec2)> {
        let cell = self.layout().block_cell_from_pos(pos)?;
        let block = self.block(self.block_at(cell)?)?;
        Some((block, pos - self.layout().block_bounding_box(cell).point()))
    }

    pub fn get_map_from(&self, pos: Vec2) -> Option<MapId> {
        let (block, local) = self.locate(pos)?;
        block.get_map_from(&self.registry, local)
    }

    pub fn get_tile_from(&self, pos: Vec2) -> Option<TileId> {
        let (block, local) = self.locate(pos)?;
        block.get_tile_from(&self.registry, local)
    }

    // Mutation

    fn place_block(
        &mut self,
        pos: Vec2,
        block: Option<BlockId>,
        background: bool,
    ) -> Result<(), WorldError> {
        let (_, index) = self.slot(pos)?;
        if let Some(id) = block {
            self.block(id).ok_or(WorldError::UnknownBlock(id))?;
        }
        let grid = if background { &mut self.background } else { &mut self.grid };
        grid[index] = block;
        Ok(())
    }

    pub fn set_block(&mut self, pos: Vec2, block: Option<BlockId>) -> Result<(), WorldError> {
        self.place_block(pos, block, false)
    }

    /// Places scenery that is painted but never collided with.
    pub fn set_background_block(
        &mut self,
        pos: Vec2,
        block: Option<BlockId>,
    ) -> Result<(), WorldError> {
        self.place_block(pos, block, true)
    }

    /// Block under `pos`, placing a new empty one when the slot is vacant.
    fn block_for_write(&mut self, pos: Vec2) -> Result<(BlockId, Vec2), WorldError> {
        let (cell, index) = self.slot(pos)?;
        let id = match self.grid[index] {
            Some(id) => id,
            None => {
                let id = self.add_block();
                log::debug!("created block {id:?} at {cell}");
                self.grid[index] = Some(id);
                id
            }
        };
        Ok((id, pos - self.layout().block_bounding_box(cell).point()))
    }

    pub fn set_map(&mut self, pos: Vec2, map: Option<MapId>) -> Result<(), WorldError> {
        let (id, local) = self.block_for_write(pos)?;
        let (block, registry) = self.block_mut(id).ok_or(WorldError::UnknownBlock(id))?;
        block.set_map(&*registry, local, map)
    }

    pub fn set_tile(&mut self, pos: Vec2, tile: TileId) -> Result<MapId, WorldError> {
        self.tile(tile).ok_or(WorldError::UnknownTile(tile))?;
        let (id, local) = self.block_for_write(pos)?;
        let (block, registry) = self.block_mut(id).ok_or(WorldError::UnknownBlock(id))?;
        block.set_tile(registry, local, tile)
    }

    pub fn fill_rectangle_with_map(&mut self, rect: Rect, map: MapId) -> Result<(), WorldError> {
        let map_size = self.layout().map_size() as f32;
        let col = (rect.x / map_size) as i32;
        let row = (rect.y / map_size) as i32;
        let cols = (rect.w / map_size) as i32;
        let rows = (rect.h / map_size) as i32;

        for c in 0..cols {
            for r in 0..rows {
                let pos = vec2((col + c) as f32 * map_size, (row + r) as f32 * map_size);
                self.set_map(pos, Some(map))?;
            }
        }
        Ok(())
    }

    pub fn fill_rectangle_with_block(&mut self, rect: Rect, block: BlockId) -> Result<(), WorldError> {
        self.fill_grid_with_block(rect, block, false)
    }

    pub fn fill_background_with_block(&mut self, rect: Rect, block: BlockId) -> Result<(), WorldError> {
        self.fill_grid_with_block(rect, block, true)
    }

    fn fill_grid_with_block(
        &mut self,
        rect: Rect,
        block: BlockId,
        background: bool,
    ) -> Result<(), WorldError> {
        let block_size = self.layout().block_size() as f32;
        let col = (rect.x / block_size) as i32;
        let row = (rect.y / block_size) as i32;
        let cols = (rect.w / block_size) as i32;
        let rows = (rect.h / block_size) as i32;

        for c in 0..cols {
            for r in 0..rows {
                let pos = vec2((col + c) as f32 * block_size, (row + r) as f32 * block_size);
                self.place_block(pos, Some(block), background)?;
            }
        }
        Ok(())
    }

    /// Fills a box with one solid-colored map and returns it.
    pub fn add_rectangle(
        &mut self,
        rect: Rect,
        color: Color,
        collision_data: CollisionData,
    ) -> Result<MapId, WorldError> {
        let map = self.add_map_color(color, collision_data);
        self.fill_rectangle_with_map(rect, map)?;
        Ok(map)
    }

    // Removal

    pub fn remove_tile(&mut self, id: TileId) -> Result<(), WorldError> {
        self.registry.remove_tile(id)
    }

    /// Drops the map and clears it from every block.
    pub fn remove_map(&mut self, id: MapId) -> Result<(), WorldError> {
        self.registry
            .maps
            .remove(id)
            .ok_or(WorldError::UnknownMap(id))?;
        let cleared: usize = self
            .blocks
            .iter_mut()
            .flatten()
            .map(|block| block.remove_map(Some(id)))
            .sum();
        log::debug!("removed map {id:?} from {cleared} cells");
        Ok(())
    }

    /// Drops the block and clears it from both grids.
    pub fn remove_block(&mut self, id: BlockId) -> Result<(), WorldError> {
        self.blocks
            .get_mut(id.0)
            .and_then(|block| block.take())
            .ok_or(WorldError::UnknownBlock(id))?;
        let slots = self.grid.iter_mut().chain(self.background.iter_mut());
        for slot in slots.filter(|slot| **slot == Some(id)) {
            *slot = None;
        }
        log::debug!("removed block {id:?}");
        Ok(())
    }

    /// Forgets every tile, map and block. Ids start over afterwards.
    pub fn clear(&mut self) {
        self.grid.iter_mut().for_each(|slot| *slot = None);
        self.background.iter_mut().for_each(|slot| *slot = None);
        self.blocks.clear();
        self.registry.clear();
        log::info!("world cleared");
    }

    // Collision

    /// Classifies the foreground terrain a box overlaps. Maps are examined
    /// in row-major order; `ignore` masks whole classes out of the result.
    pub fn get_collision_flags(
        &self,
        collision_box: Rect,
        ignore: CollisionFlags,
        precise: bool,
    ) -> CollisionQuery {
        let mut query = CollisionQuery::default();
        let map_rows = self.map_rows() as i32;
        let map_cols = self.map_cols() as i32;
        if map_rows == 0 || map_cols == 0 {
            return query;
        }

        let layout = *self.layout();
        let (Some(start), Some(end)) = (
            layout.map_cell_from_pos(collision_box.point()),
            layout.map_cell_from_pos(vec2(collision_box.right(), collision_box.bottom())),
        ) else {
            return query;
        };
        let start_row = start.row.clamp(0, map_rows - 1);
        let start_col = start.col.clamp(0, map_cols - 1);
        let end_row = end.row.clamp(0, map_rows - 1);
        let end_col = end.col.clamp(0, map_cols - 1);

        for row in start_row..=end_row {
            for col in start_col..=end_col {
                let cell = Cell::new(row, col);
                let map_box = layout.map_bounding_box(cell);
                let Some(map_id) = self.get_map_from(map_box.point()) else {
                    continue;
                };
                let Some(map) = self.map(map_id) else {
                    continue;
                };
                let data = map.collision_data();
                if data == CollisionData::NONE || intersection_area(map_box, collision_box) <= 0.0 {
                    continue;
                }

                let flag = if data.is_solid_block() {
                    CollisionFlags::BLOCK
                } else if data.is_slope() {
                    let Some(triangle) = data.slope_triangle(layout.map_size() as f32) else {
                        continue;
                    };
                    let triangle = triangle.translate(map_box.point());
                    if ignore.contains(CollisionFlags::SLOPE)
                        || (precise && !triangle.intersects(&collision_box))
                    {
                        continue;
                    }
                    query.slope = Some(triangle);
                    CollisionFlags::SLOPE
                } else {
                    data.to_flags()
                };

                if flag.is_empty() || ignore.contains(flag) {
                    continue;
                }
                query.flags |= flag;
                query.placements.push(CollisionPlacement {
                    flag,
                    placement: MapPlacement { cell, map: map_id },
                });
            }
        }
        query
    }

    // Painting

    fn paint_layer(
        &self,
        grid: &[Option<BlockId>],
        target: &mut dyn PaintTarget,
        view: Rect,
        up_layer: bool,
    ) {
        let layout = self.layout();
        for col in 0..self.block_cols as i32 {
            for row in 0..self.block_rows as i32 {
                let cell = Cell::new(row, col);
                let block_box = layout.block_bounding_box(cell);
                if !block_box.overlaps(&view) {
                    continue;
                }
                let Some(block) = self
                    .grid_index(cell)
                    .and_then(|index| grid[index])
                    .and_then(|id| self.block(id))
                else {
                    continue;
                };
                let offset = block_box.point() - view.point();
                if up_layer {
                    block.paint_up_layer(&self.registry, target, offset);
                } else {
                    block.paint_down_layer(&self.registry, target, offset);
                }
            }
        }
    }

    /// Both layers of the background blocks touching `view`.
    pub fn paint_background(&self, target: &mut dyn PaintTarget, view: Rect) {
        self.paint_layer(&self.background, target, view, false);
        self.paint_layer(&self.background, target, view, true);
    }

    /// Paints the layer behind entities for every block touching `view`.
    /// Draw positions are relative to the view's left-top corner.
    pub fn paint_down_layer(&self, target: &mut dyn PaintTarget, view: Rect) {
        self.paint_layer(&self.grid, target, view, false);
    }

    pub fn paint_up_layer(&self, target: &mut dyn PaintTarget, view: Rect) {
        self.paint_layer(&self.grid, target, view, true);
    }
}
