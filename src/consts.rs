//! Engine-wide constants. Speeds are in pixels per tick at [`TICKRATE`].

pub const TICKRATE: u32 = 60;
pub const TICK: f32 = 1.0 / TICKRATE as f32;

pub const DEFAULT_TILE_SIZE: u32 = 8;
pub const DEFAULT_SIDE_TILES_PER_MAP: u32 = 2;
pub const DEFAULT_SIDE_MAPS_PER_BLOCK: u32 = 2;

pub const SCREEN_WIDTH: f32 = 256.0;
pub const SCREEN_HEIGHT: f32 = 224.0;

pub const GRAVITY: f32 = 0.25;
pub const TERMINAL_DOWNWARD_SPEED: f32 = 5.75;

/// Slope heights are authored against a 16 pixel map.
pub const SLOPE_UNIT: f32 = 16.0;

pub const MAX_SHOTS: u32 = 3;

pub const LEMON_HITBOX_WIDTH: f32 = 8.0;
pub const LEMON_HITBOX_HEIGHT: f32 = 8.0;
pub const LEMON_INITIAL_SPEED: f32 = 4.0;
pub const LEMON_ACCELERATION: f32 = 0.25;
pub const LEMON_TERMINAL_SPEED: f32 = 6.0;
pub const LEMON_REFLECTION_VSPEED: f32 = -3.0;

pub const DEFAULT_HEALTH: u32 = 16;
