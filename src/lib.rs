//! Tile/collision world and entity core of a side-scrolling action engine.
//!
//! A [`world::World`] places blocks on a foreground and a background grid,
//! each block holds maps and each map holds tiles. Entities in an
//! [`entity::EntityList`] move through the world one fixed tick at a time
//! and are painted between the foreground's two layers by
//! [`render::render_frame`].

pub mod animation;
pub mod block;
pub mod cell;
pub mod collision;
pub mod config;
pub mod consts;
pub mod direction;
pub mod effect;
pub mod enemy;
pub mod entity;
pub mod helpers;
pub mod level;
pub mod map;
pub mod render;
pub mod sprite;
pub mod tile;
pub mod weapon;
pub mod world;
