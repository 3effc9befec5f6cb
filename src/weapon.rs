use macroquad::prelude::*;
use std::any::Any;
use std::rc::Rc;

use crate::animation::{AnimationRequest, FrameSequence, SpriteSheet};
use crate::consts::*;
use crate::direction::Direction;
use crate::entity::EntityId;
use crate::sprite::{SimContext, SimEvent, Sprite, SpriteLogic, do_physics, is_offscreen, kill};

/// Projectile base: flies through terrain and dies once it leaves the screen.
pub struct Weapon {
    pub sprite: Sprite,
    shooter: EntityId,
    direction: Direction,
}

impl Weapon {
    pub fn new(
        name: &str,
        sheet: Rc<SpriteSheet>,
        shooter: EntityId,
        origin: Vec2,
        direction: Direction,
    ) -> Self {
        let mut sprite = Sprite::new(name, sheet, origin, true);
        sprite.check_collision_with_world = false;
        sprite.can_go_out_of_map_bounds = true;
        Self {
            sprite,
            shooter,
            direction,
        }
    }

    pub fn shooter(&self) -> EntityId {
        self.shooter
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Picks the mirrored slot of a directional pair when facing left.
    fn facing_slot(&self, index: usize) -> usize {
        if self.direction == Direction::LEFT {
            index + 1
        } else {
            index
        }
    }
}

pub fn weapon_think<L: SpriteLogic + ?Sized>(logic: &mut L, ctx: &mut SimContext) {
    do_physics(logic, ctx);
    if is_offscreen(logic, ctx.screen) {
        kill(logic, ctx);
    }
}

pub fn lemon_sheet() -> SpriteSheet {
    let shot = Rect::new(-4.0, -3.0, 8.0, 6.0);
    let hit = Rect::new(-6.0, -6.0, 12.0, 12.0);
    SpriteSheet::new("lemon")
        .with_sequence(FrameSequence::uniform("Shot", 2, shot, shot).looping_from(0))
        .with_sequence(FrameSequence::uniform("ShotHit", 4, hit, hit))
}

/// The buster's basic shot.
pub struct BusterLemon {
    weapon: Weapon,
    dash: bool,
    reflected: bool,
    exploding: bool,
    shot_slot: Option<usize>,
    hit_slot: Option<usize>,
}

impl BusterLemon {
    pub fn new(
        sheet: Rc<SpriteSheet>,
        shooter: EntityId,
        origin: Vec2,
        direction: Direction,
        dash: bool,
    ) -> Self {
        let weapon = Weapon::new("lemon", sheet, shooter, origin, direction);
        Self {
            weapon,
            dash,
            reflected: false,
            exploding: false,
            shot_slot: None,
            hit_slot: None,
        }
    }

    pub fn shooter(&self) -> EntityId {
        self.weapon.shooter
    }

    pub fn dash(&self) -> bool {
        self.dash
    }

    pub fn reflected(&self) -> bool {
        self.reflected
    }

    pub fn exploding(&self) -> bool {
        self.exploding
    }

    /// Bounces the lemon back with an upward kick. Only the first bounce
    /// counts, and exploding lemons ignore it.
    pub fn reflect(&mut self) {
        if self.reflected || self.exploding {
            return;
        }
        self.reflected = true;
        let vel = &mut self.weapon.sprite.vel;
        *vel = vec2(-vel.x, LEMON_REFLECTION_VSPEED);
    }

    /// Stops the lemon and plays the hit animation. The lemon dies when it ends.
    pub fn explode(&mut self) {
        if self.exploding {
            return;
        }
        self.exploding = true;
        self.weapon.sprite.vel = Vec2::ZERO;
        if let Some(slot) = self.hit_slot {
            let animations = &mut self.weapon.sprite.animations;
            animations.switch_to(slot);
            if let Some(animation) = animations.active_mut() {
                animation.start_from_begin();
            }
        }
    }
}

impl SpriteLogic for BusterLemon {
    fn sprite(&self) -> &Sprite {
        &self.weapon.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.weapon.sprite
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn gravity(&self) -> f32 {
        if self.reflected && self.dash && !self.exploding {
            GRAVITY
        } else {
            0.0
        }
    }

    fn collision_box(&self) -> Rect {
        let origin = self.weapon.sprite.origin;
        Rect::new(
            origin.x - LEMON_HITBOX_WIDTH / 2.0,
            origin.y - LEMON_HITBOX_HEIGHT / 2.0,
            LEMON_HITBOX_WIDTH,
            LEMON_HITBOX_HEIGHT,
        )
    }

    fn on_create_animation(&mut self, index: usize, request: &mut AnimationRequest) {
        request.start_on = false;
        request.start_visible = false;
        match request.sequence.as_str() {
            "Shot" => self.shot_slot = Some(self.weapon.facing_slot(index)),
            "ShotHit" => self.hit_slot = Some(self.weapon.facing_slot(index)),
            _ => {}
        }
    }

    fn on_spawn(&mut self) {
        let speed = if self.dash {
            LEMON_TERMINAL_SPEED
        } else {
            LEMON_INITIAL_SPEED
        };
        let sign = self.weapon.direction.horizontal_sign();
        self.weapon.sprite.vel = vec2(sign * speed, 0.0);
        self.reflected = false;
        self.exploding = false;

        if let Some(slot) = self.shot_slot {
            let animations = &mut self.weapon.sprite.animations;
            animations.switch_to(slot);
            if let Some(animation) = animations.active_mut() {
                animation.start_from_begin();
            }
        }
    }

    fn think(&mut self, ctx: &mut SimContext) {
        if self.exploding {
            if self.hit_slot.is_none() {
                kill(self, ctx);
            }
            return;
        }

        let vel = &mut self.weapon.sprite.vel;
        vel.x += if vel.x > 0.0 {
            LEMON_ACCELERATION
        } else {
            -LEMON_ACCELERATION
        };
        vel.x = vel.x.clamp(-LEMON_TERMINAL_SPEED, LEMON_TERMINAL_SPEED);

        weapon_think(self, ctx);
    }

    fn on_death(&mut self, ctx: &mut SimContext) {
        ctx.events.push(SimEvent::ShotExpired {
            shooter: self.weapon.shooter,
        });
    }

    fn on_animation_end(&mut self, slot: usize, ctx: &mut SimContext) {
        if self.exploding && Some(slot) == self.hit_slot {
            kill(self, ctx);
        }
    }
}
