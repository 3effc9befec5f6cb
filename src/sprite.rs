//! Shared state and lifecycle of everything that moves through the world.
//!
//! Concrete entities own a [`Sprite`] and implement [`SpriteLogic`]. The
//! lifecycle steps (`spawn`, `do_physics`, `kill`, `post_think`) are free
//! functions generic over the logic so a type can run the default step and
//! then add its own behavior around it.

use macroquad::prelude::*;
use std::any::Any;
use std::rc::Rc;

use crate::animation::{Animation, AnimationRequest, AnimationSet, SpriteSheet};
use crate::collision::CollisionFlags;
use crate::consts::{DEFAULT_HEALTH, GRAVITY, TERMINAL_DOWNWARD_SPEED};
use crate::entity::EntityId;
use crate::helpers::{clamp_hitbox_to_rect, intersection_area};
use crate::render::{PaintTarget, SpriteDraw};
use crate::world::World;

const CONTACT_STEPS: u32 = 10;

pub enum SimEvent {
    /// A lemon fired by `shooter` left play.
    ShotExpired { shooter: EntityId },
}

pub struct SimContext<'a> {
    pub world: &'a World,
    pub screen: Rect,
    pub entity: EntityId,
    pub events: &'a mut Vec<SimEvent>,
}

pub struct Sprite {
    name: String,
    sheet: Rc<SpriteSheet>,
    pub origin: Vec2,
    last_origin: Vec2,
    pub vel: Vec2,
    pub check_collision_with_world: bool,
    pub can_go_out_of_map_bounds: bool,
    directional: bool,
    parent: Option<EntityId>,
    pub animations: AnimationSet,
    landed: bool,
    marked_to_remove: bool,
    health: u32,
}

impl Sprite {
    pub fn new(name: &str, sheet: Rc<SpriteSheet>, origin: Vec2, directional: bool) -> Self {
        Self {
            name: name.to_string(),
            sheet,
            origin,
            last_origin: origin,
            vel: Vec2::ZERO,
            check_collision_with_world: true,
            can_go_out_of_map_bounds: false,
            directional,
            parent: None,
            animations: AnimationSet::default(),
            landed: false,
            marked_to_remove: false,
            health: DEFAULT_HEALTH,
        }
    }

    pub fn with_parent(mut self, parent: Option<EntityId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn directional(&self) -> bool {
        self.directional
    }

    /// Displacement since the start of the current tick.
    pub fn delta(&self) -> Vec2 {
        self.origin - self.last_origin
    }

    pub(crate) fn begin_tick(&mut self) {
        self.last_origin = self.origin;
    }

    pub fn landed(&self) -> bool {
        self.landed
    }

    pub fn marked_to_remove(&self) -> bool {
        self.marked_to_remove
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn set_health(&mut self, health: u32) {
        self.health = health;
    }

    /// Returns true when the hit drained the last point of health.
    pub fn hurt(&mut self, damage: u32) -> bool {
        let alive = self.health > 0;
        self.health = self.health.saturating_sub(damage);
        alive && self.health == 0
    }

    /// Union of the visible frames in world space, falling back to the
    /// collision frame when nothing is shown.
    pub fn bounding_box(&self) -> Rect {
        self.animations
            .bounding_box()
            .unwrap_or_else(|| self.animations.current_collision_box())
            .offset(self.origin)
    }

    pub fn paint(&self, target: &mut dyn PaintTarget, view: Rect) {
        let offset = self.origin - view.point();
        for animation in self.animations.iter().filter(|animation| animation.visible()) {
            target.draw_sprite(&SpriteDraw {
                name: &self.name,
                sequence: animation.sequence_name(),
                frame: animation.current_frame(),
                dest: animation.current_bounding_box().offset(offset),
                mirrored: animation.mirrored(),
            });
        }
    }
}

/// Per-type behavior layered over [`Sprite`].
pub trait SpriteLogic: Any {
    fn sprite(&self) -> &Sprite;
    fn sprite_mut(&mut self) -> &mut Sprite;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn gravity(&self) -> f32 {
        GRAVITY
    }

    fn terminal_downward_speed(&self) -> f32 {
        TERMINAL_DOWNWARD_SPEED
    }

    /// World-space box used against terrain and other entities.
    fn collision_box(&self) -> Rect {
        let sprite = self.sprite();
        sprite.animations.current_collision_box().offset(sprite.origin)
    }

    /// Called once per animation slot before it is built. The request may be
    /// rewritten, and the slot index recorded.
    fn on_create_animation(&mut self, _index: usize, _request: &mut AnimationRequest) {}

    fn on_spawn(&mut self) {}

    fn think(&mut self, ctx: &mut SimContext) {
        do_physics(self, ctx);
    }

    fn on_death(&mut self, _ctx: &mut SimContext) {}

    fn on_animation_end(&mut self, _slot: usize, _ctx: &mut SimContext) {}
}

/// Builds the animation slots and resets the kinematic state. Directional
/// sprites get two slots per sequence, the second one mirrored.
pub fn spawn<L: SpriteLogic + ?Sized>(logic: &mut L) {
    let sheet = logic.sprite().sheet.clone();
    let directional = logic.sprite().directional;
    let mut index = 0;
    for (sequence_index, sequence) in sheet.sequences().iter().enumerate() {
        let mut request = AnimationRequest {
            sequence: sequence.name.clone(),
            initial_frame: 0,
            start_visible: true,
            start_on: true,
        };
        logic.on_create_animation(index, &mut request);
        let resolved = sheet.sequence(&request.sequence).unwrap_or(sequence_index);

        let animations = &mut logic.sprite_mut().animations;
        animations.push(Animation::new(index, sheet.clone(), resolved, &request, false));
        index += 1;
        if directional {
            animations.push(Animation::new(index, sheet.clone(), resolved, &request, true));
            index += 1;
        }
    }

    let sprite = logic.sprite_mut();
    sprite.vel = Vec2::ZERO;
    sprite.last_origin = sprite.origin;
    sprite.landed = false;
    sprite.marked_to_remove = false;
    sprite.health = DEFAULT_HEALTH;
    logic.on_spawn();
}

fn blocked(world: &World, collision_box: Rect) -> bool {
    world
        .get_collision_flags(collision_box, CollisionFlags::empty(), true)
        .flags
        .intersects(CollisionFlags::BLOCK | CollisionFlags::SLOPE)
}

/// Longest part of `delta` the box can travel before touching terrain.
fn contact_move(world: &World, collision_box: Rect, delta: Vec2) -> Vec2 {
    if delta == Vec2::ZERO || !blocked(world, collision_box.offset(delta)) {
        return delta;
    }
    if blocked(world, collision_box) {
        return Vec2::ZERO;
    }

    let (mut free, mut hit) = (0.0, 1.0);
    for _ in 0..CONTACT_STEPS {
        let mid = (free + hit) / 2.0;
        if blocked(world, collision_box.offset(delta * mid)) {
            hit = mid;
        } else {
            free = mid;
        }
    }
    delta * free
}

/// Moves the sprite by its velocity, resolving terrain contacts one axis at
/// a time, then applies gravity.
pub fn do_physics<L: SpriteLogic + ?Sized>(logic: &mut L, ctx: &SimContext) {
    let gravity = logic.gravity();
    let terminal = logic.terminal_downward_speed();
    let collision_box = logic.collision_box();
    let world = ctx.world;

    let sprite = logic.sprite_mut();
    let delta = sprite.vel;
    let moved = if sprite.check_collision_with_world {
        let dx = contact_move(world, collision_box, vec2(delta.x, 0.0));
        let dy = contact_move(world, collision_box.offset(dx), vec2(0.0, delta.y));
        if dx.x != delta.x {
            sprite.vel.x = 0.0;
        }
        if dy.y != delta.y {
            sprite.vel.y = 0.0;
        }
        let moved = dx + dy;
        sprite.landed = blocked(world, collision_box.offset(moved + vec2(0.0, 1.0)));
        moved
    } else {
        sprite.landed = false;
        delta
    };
    sprite.origin += moved;

    if !sprite.can_go_out_of_map_bounds {
        sprite.origin += clamp_hitbox_to_rect(collision_box.offset(moved), world.bounds());
    }

    sprite.vel.y += gravity;
    if sprite.vel.y > terminal {
        sprite.vel.y = terminal;
    }
    if sprite.landed && sprite.vel.y > 0.0 {
        sprite.vel.y = 0.0;
    }
}

/// Runs the death hook once and marks the sprite for removal.
pub fn kill<L: SpriteLogic + ?Sized>(logic: &mut L, ctx: &mut SimContext) {
    if logic.sprite().marked_to_remove {
        return;
    }
    logic.on_death(ctx);
    logic.sprite_mut().marked_to_remove = true;
}

pub fn is_offscreen<L: SpriteLogic + ?Sized>(logic: &L, screen: Rect) -> bool {
    intersection_area(logic.sprite().bounding_box(), screen) <= 0.0
}

/// Advances animations and dispatches the end hook for every finished slot.
pub fn post_think<L: SpriteLogic + ?Sized>(logic: &mut L, ctx: &mut SimContext) {
    let ended = logic.sprite_mut().animations.on_frame();
    for slot in ended {
        logic.on_animation_end(slot, ctx);
    }
}
