use macroquad::prelude::*;
use std::any::Any;
use std::rc::Rc;

use crate::animation::{AnimationRequest, FrameSequence, SpriteSheet};
use crate::entity::EntityId;
use crate::sprite::{Sprite, SpriteLogic};

pub const MIN_CHARGE_LEVEL: u8 = 1;
pub const MAX_CHARGE_LEVEL: u8 = 2;

pub fn charging_sheet() -> SpriteSheet {
    let level1 = Rect::new(-12.0, -12.0, 24.0, 24.0);
    let level2 = Rect::new(-16.0, -16.0, 32.0, 32.0);
    SpriteSheet::new("charging")
        .with_sequence(FrameSequence::uniform("Level1", 4, level1, Rect::default()).looping_from(0))
        .with_sequence(FrameSequence::uniform("Level2", 4, level2, Rect::default()).looping_from(0))
}

/// Glow drawn around a charging shooter. Follows its parent and never
/// touches terrain.
pub struct ChargingEffect {
    sprite: Sprite,
    level: u8,
    level_slots: [Option<usize>; 2],
}

impl ChargingEffect {
    pub fn new(sheet: Rc<SpriteSheet>, charger: Option<EntityId>, origin: Vec2) -> Self {
        let mut sprite = Sprite::new("charging", sheet, origin, false).with_parent(charger);
        sprite.check_collision_with_world = false;
        sprite.can_go_out_of_map_bounds = true;
        Self {
            sprite,
            level: MIN_CHARGE_LEVEL,
            level_slots: [None; 2],
        }
    }

    pub fn charger(&self) -> Option<EntityId> {
        self.sprite.parent()
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Levels outside 1..=2 are ignored.
    pub fn set_level(&mut self, level: u8) {
        if !(MIN_CHARGE_LEVEL..=MAX_CHARGE_LEVEL).contains(&level) {
            log::debug!("ignoring charge level {level}");
            return;
        }
        self.level = level;
        if let Some(slot) = self.level_slots[(level - MIN_CHARGE_LEVEL) as usize] {
            self.sprite.animations.switch_to(slot);
        }
    }
}

impl SpriteLogic for ChargingEffect {
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn gravity(&self) -> f32 {
        0.0
    }

    fn on_create_animation(&mut self, index: usize, request: &mut AnimationRequest) {
        request.start_on = false;
        request.start_visible = false;
        match request.sequence.as_str() {
            "Level1" => self.level_slots[0] = Some(index),
            "Level2" => self.level_slots[1] = Some(index),
            _ => {}
        }
    }

    fn on_spawn(&mut self) {
        self.level = MIN_CHARGE_LEVEL;
        if let Some(slot) = self.level_slots[0] {
            let animations = &mut self.sprite.animations;
            animations.switch_to(slot);
            if let Some(animation) = animations.active_mut() {
                animation.start_from_begin();
            }
        }
    }
}
