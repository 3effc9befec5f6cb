use macroquad::prelude::*;
use serde::Deserialize;
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::animation::{AnimationRequest, SpriteSheet};
use crate::config::{LoadError, is_yaml};
use crate::consts::DEFAULT_HEALTH;
use crate::direction::Direction;
use crate::sprite::{SimContext, Sprite, SpriteLogic, do_physics};

#[derive(Clone, Debug)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    pub sheet: Rc<SpriteSheet>,
    pub idle_sequence: String,
    pub contact_damage: u32,
    pub health: u32,
    pub respawnable: bool,
    /// Shots bounce off instead of hurting.
    pub reflects_shots: bool,
    pub walk_speed: f32,
}

/// World-colliding, gravity-bound entity that walks back and forth.
pub struct Enemy {
    sprite: Sprite,
    def: EnemyDef,
    facing: Direction,
    /// Right-facing idle slot; the mirrored one follows it.
    idle_base: Option<usize>,
}

impl Enemy {
    /// Enemies only face left or right. Any facing without a left
    /// component, `NONE` included, starts out facing right.
    pub fn new(def: EnemyDef, origin: Vec2, facing: Direction) -> Self {
        let facing = if facing.contains(Direction::LEFT) {
            Direction::LEFT
        } else {
            Direction::RIGHT
        };
        Self {
            sprite: Sprite::new(&def.id, def.sheet.clone(), origin, true),
            def,
            facing,
            idle_base: None,
        }
    }

    pub fn def(&self) -> &EnemyDef {
        &self.def
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn contact_damage(&self) -> u32 {
        self.def.contact_damage
    }

    pub fn respawnable(&self) -> bool {
        self.def.respawnable
    }

    pub fn reflects_shots(&self) -> bool {
        self.def.reflects_shots
    }

    fn walk_velocity(&self) -> f32 {
        self.def.walk_speed * self.facing.horizontal_sign()
    }

    fn idle_slot(&self) -> Option<usize> {
        self.idle_base
            .map(|base| base + usize::from(self.facing == Direction::LEFT))
    }

    fn turn_around(&mut self) {
        self.facing = self.facing.opposite();
        if let Some(slot) = self.idle_slot() {
            self.sprite.animations.switch_to(slot);
        }
    }
}

impl SpriteLogic for Enemy {
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

    fn on_create_animation(&mut self, index: usize, request: &mut AnimationRequest) {
        request.start_on = false;
        request.start_visible = false;
        if request.sequence == self.def.idle_sequence {
            self.idle_base = Some(index);
        }
    }

    fn on_spawn(&mut self) {
        self.sprite.set_health(self.def.health);
        self.sprite.vel.x = self.walk_velocity();
        if let Some(slot) = self.idle_slot() {
            let animations = &mut self.sprite.animations;
            animations.switch_to(slot);
            if let Some(animation) = animations.active_mut() {
                animation.start_from_begin();
            }
        }
    }

    fn think(&mut self, ctx: &mut SimContext) {
        let walking = self.walk_velocity();
        self.sprite.vel.x = walking;
        do_physics(self, ctx);
        if walking != 0.0 && self.sprite.vel.x == 0.0 {
            self.turn_around();
        }
    }
}

pub struct EnemyDatabase {
    pub enemies: Vec<EnemyDef>,
    lookup: HashMap<String, usize>,
}

impl EnemyDatabase {
    pub fn empty() -> Self {
        Self {
            enemies: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Reads every YAML definition in `root`. Sheet paths are relative to it.
    pub fn load_from(root: impl AsRef<Path>) -> Result<Self, LoadError> {
        let root = root.as_ref();
        let mut enemies = Vec::new();
        let mut lookup = HashMap::new();
        let mut sheets: HashMap<String, Rc<SpriteSheet>> = HashMap::new();

        if !root.exists() {
            log::warn!("enemy directory {} does not exist", root.display());
            return Ok(Self::empty());
        }

        for entry in std::fs::read_dir(root)? {
            let path = entry?.path();
            if !is_yaml(&path) {
                continue;
            }
            let raw: EnemyFile = serde_yaml::from_str(&std::fs::read_to_string(&path)?)?;

            let sheet = match sheets.get(&raw.sheet) {
                Some(sheet) => sheet.clone(),
                None => {
                    let sheet = Rc::new(SpriteSheet::load(root.join(&raw.sheet))?);
                    sheets.insert(raw.sheet.clone(), sheet.clone());
                    sheet
                }
            };
            if sheet.sequence(&raw.idle_sequence).is_none() {
                return Err(LoadError::MissingDefinition(format!(
                    "sequence {} in sheet {}",
                    raw.idle_sequence, raw.sheet
                )));
            }

            let def = EnemyDef {
                name: raw.name.unwrap_or_else(|| raw.id.clone()),
                id: raw.id.clone(),
                sheet,
                idle_sequence: raw.idle_sequence,
                contact_damage: raw.contact_damage,
                health: raw.health,
                respawnable: raw.respawnable,
                reflects_shots: raw.reflects_shots,
                walk_speed: raw.walk_speed,
            };
            log::debug!("loaded enemy {} from {}", def.id, path.display());

            if let Some(&index) = lookup.get(&raw.id) {
                log::warn!("enemy {} defined twice, keeping {}", raw.id, path.display());
                enemies[index] = def;
            } else {
                lookup.insert(raw.id, enemies.len());
                enemies.push(def);
            }
        }

        Ok(Self { enemies, lookup })
    }

    pub fn get(&self, id: &str) -> Option<&EnemyDef> {
        self.lookup.get(id).map(|&index| &self.enemies[index])
    }

    pub fn spawn(&self, id: &str, origin: Vec2, facing: Direction) -> Option<Enemy> {
        let def = self.get(id)?;
        Some(Enemy::new(def.clone(), origin, facing))
    }
}

#[derive(Deserialize)]
struct EnemyFile {
    id: String,
    name: Option<String>,
    sheet: String,
    #[serde(default = "default_idle_sequence")]
    idle_sequence: String,
    #[serde(default = "default_contact_damage")]
    contact_damage: u32,
    #[serde(default = "default_health")]
    health: u32,
    #[serde(default = "default_respawnable")]
    respawnable: bool,
    #[serde(default)]
    reflects_shots: bool,
    #[serde(default)]
    walk_speed: f32,
}

fn default_idle_sequence() -> String {
    "Idle".to_string()
}

fn default_contact_damage() -> u32 {
    2
}

fn default_health() -> u32 {
    DEFAULT_HEALTH
}

fn default_respawnable() -> bool {
    true
}
