use macroquad::prelude::*;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::cell::Cell;
use crate::consts::*;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing definition: {0}")]
    MissingDefinition(String),
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// Grid geometry shared by the world, its blocks and maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub tile_size: u32,
    pub side_tiles_per_map: u32,
    pub side_maps_per_block: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            side_tiles_per_map: DEFAULT_SIDE_TILES_PER_MAP,
            side_maps_per_block: DEFAULT_SIDE_MAPS_PER_BLOCK,
        }
    }
}

impl Layout {
    pub fn map_size(&self) -> u32 {
        self.tile_size * self.side_tiles_per_map
    }

    pub fn block_size(&self) -> u32 {
        self.map_size() * self.side_maps_per_block
    }

    // Truncating division, matching how placements were authored.
    // NaN would truncate to 0, so non-finite positions have no cell.
    fn cell_from_pos(pos: Vec2, size: u32) -> Option<Cell> {
        if !pos.is_finite() {
            return None;
        }
        let size = size as f32;
        Some(Cell::new((pos.y / size) as i32, (pos.x / size) as i32))
    }

    pub fn tile_cell_from_pos(&self, pos: Vec2) -> Option<Cell> {
        Self::cell_from_pos(pos, self.tile_size)
    }

    pub fn map_cell_from_pos(&self, pos: Vec2) -> Option<Cell> {
        Self::cell_from_pos(pos, self.map_size())
    }

    pub fn block_cell_from_pos(&self, pos: Vec2) -> Option<Cell> {
        Self::cell_from_pos(pos, self.block_size())
    }

    fn cell_box(cell: Cell, size: u32) -> Rect {
        let size = size as f32;
        Rect::new(cell.col as f32 * size, cell.row as f32 * size, size, size)
    }

    pub fn tile_bounding_box(&self, cell: Cell) -> Rect {
        Self::cell_box(cell, self.tile_size)
    }

    pub fn map_bounding_box(&self, cell: Cell) -> Rect {
        Self::cell_box(cell, self.map_size())
    }

    pub fn block_bounding_box(&self, cell: Cell) -> Rect {
        Self::cell_box(cell, self.block_size())
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if self.tile_size == 0 || self.side_tiles_per_map == 0 || self.side_maps_per_block == 0 {
            return Err(LoadError::InvalidLayout(format!("{self:?}")));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: Layout,
    pub block_rows: u32,
    pub block_cols: u32,
    pub screen: [f32; 2],
    pub max_shots: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            block_rows: 8,
            block_cols: 32,
            screen: [SCREEN_WIDTH, SCREEN_HEIGHT],
            max_shots: MAX_SHOTS,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let config: EngineConfig = serde_yaml::from_str(&std::fs::read_to_string(path)?)?;
        config.layout.validate()?;
        Ok(config)
    }

    pub fn screen_box(&self, left_top: Vec2) -> Rect {
        Rect::new(left_top.x, left_top.y, self.screen[0], self.screen[1])
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_layout_sizes() {
        let layout = Layout::default();
        assert_eq!(layout.map_size(), 16);
        assert_eq!(layout.block_size(), 32);
    }

    #[test]
    fn cell_conversion_truncates_toward_zero() {
        let layout = Layout::default();
        assert_eq!(layout.map_cell_from_pos(vec2(31.9, 15.99)), Some(Cell::new(0, 1)));
        assert_eq!(layout.tile_cell_from_pos(vec2(8.0, 17.0)), Some(Cell::new(2, 1)));
        // -3/16 truncates to 0, not -1
        assert_eq!(layout.map_cell_from_pos(vec2(-3.0, -3.0)), Some(Cell::new(0, 0)));
        assert_eq!(layout.map_cell_from_pos(vec2(-17.0, 0.0)), Some(Cell::new(0, -1)));
    }

    #[test]
    fn non_finite_positions_have_no_cell() {
        let layout = Layout::default();
        assert_eq!(layout.tile_cell_from_pos(vec2(f32::NAN, 0.0)), None);
        assert_eq!(layout.map_cell_from_pos(vec2(0.0, f32::NAN)), None);
        assert_eq!(layout.block_cell_from_pos(vec2(f32::INFINITY, 0.0)), None);
    }

    #[test]
    fn bounding_boxes_follow_cell() {
        let layout = Layout::default();
        let rect = layout.map_bounding_box(Cell::new(1, 2));
        assert_eq!(rect, Rect::new(32.0, 16.0, 16.0, 16.0));
    }

    #[test]
    fn loads_partial_yaml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "layout:\n  tile_size: 16\nblock_rows: 2").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.layout.tile_size, 16);
        assert_eq!(config.layout.side_tiles_per_map, DEFAULT_SIDE_TILES_PER_MAP);
        assert_eq!(config.block_rows, 2);
        assert_eq!(config.max_shots, MAX_SHOTS);
    }

    #[test]
    fn rejects_zero_sized_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "layout:\n  tile_size: 0").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(LoadError::InvalidLayout(_))
        ));
    }
}
