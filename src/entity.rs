use macroquad::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;

use crate::animation::SpriteSheet;
use crate::consts::MAX_SHOTS;
use crate::direction::Direction;
use crate::effect::{ChargingEffect, charging_sheet};
use crate::enemy::Enemy;
use crate::helpers::intersection_area;
use crate::render::PaintTarget;
use crate::sprite::{self, SimContext, SimEvent, SpriteLogic};
use crate::weapon::{BusterLemon, lemon_sheet};
use crate::world::World;

/// Slot of an entity in its [`EntityList`]. Slots are not reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Live lemons a shooter may keep on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotBudget {
    pub live: u32,
    pub max: u32,
}

impl ShotBudget {
    pub fn new(max: u32) -> Self {
        Self { live: 0, max }
    }

    pub fn exhausted(&self) -> bool {
        self.live >= self.max
    }
}

pub struct EntityList {
    entities: Vec<Option<Box<dyn SpriteLogic>>>,
    budgets: HashMap<EntityId, ShotBudget>,
    events: Vec<SimEvent>,
    lemon_sheet: Rc<SpriteSheet>,
    charging_sheet: Rc<SpriteSheet>,
}

impl Default for EntityList {
    fn default() -> Self {
        Self::new(Rc::new(lemon_sheet()), Rc::new(charging_sheet()))
    }
}

impl EntityList {
    pub fn new(lemon_sheet: Rc<SpriteSheet>, charging_sheet: Rc<SpriteSheet>) -> Self {
        Self {
            entities: Vec::new(),
            budgets: HashMap::new(),
            events: Vec::new(),
            lemon_sheet,
            charging_sheet,
        }
    }

    pub fn spawn(&mut self, mut logic: Box<dyn SpriteLogic>) -> EntityId {
        sprite::spawn(&mut *logic);
        let id = EntityId(self.entities.len());
        log::debug!("spawned {} as {:?}", logic.sprite().name(), id);
        self.entities.push(Some(logic));
        id
    }

    pub fn spawn_enemy(&mut self, enemy: Enemy) -> EntityId {
        self.spawn(Box::new(enemy))
    }

    pub fn spawn_charging_effect(&mut self, charger: Option<EntityId>, origin: Vec2) -> EntityId {
        let effect = ChargingEffect::new(self.charging_sheet.clone(), charger, origin);
        self.spawn(Box::new(effect))
    }

    pub fn register_shooter(&mut self, shooter: EntityId, max: u32) {
        self.budgets.insert(shooter, ShotBudget::new(max));
    }

    pub fn shot_budget(&self, shooter: EntityId) -> Option<ShotBudget> {
        self.budgets.get(&shooter).copied()
    }

    /// Fires a lemon unless the shooter already has its maximum on screen.
    /// Unregistered shooters get the default budget.
    pub fn fire_lemon(
        &mut self,
        shooter: EntityId,
        origin: Vec2,
        direction: Direction,
        dash: bool,
    ) -> Option<EntityId> {
        let budget = self
            .budgets
            .entry(shooter)
            .or_insert_with(|| ShotBudget::new(MAX_SHOTS));
        if budget.exhausted() {
            log::debug!("{:?} already has {} lemons out", shooter, budget.live);
            return None;
        }
        budget.live += 1;

        let lemon = BusterLemon::new(self.lemon_sheet.clone(), shooter, origin, direction, dash);
        Some(self.spawn(Box::new(lemon)))
    }

    pub fn len(&self) -> usize {
        self.entities.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.logic(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| EntityId(index))
    }

    pub fn logic(&self, id: EntityId) -> Option<&dyn SpriteLogic> {
        self.entities.get(id.0)?.as_deref()
    }

    pub fn get<T: SpriteLogic>(&self, id: EntityId) -> Option<&T> {
        self.logic(id)?.as_any().downcast_ref()
    }

    pub fn get_mut<T: SpriteLogic>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(id.0)?
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut()
    }

    pub fn origin(&self, id: EntityId) -> Option<Vec2> {
        self.logic(id).map(|logic| logic.sprite().origin)
    }

    /// Moves an entity directly, carrying its children along.
    pub fn set_origin(&mut self, id: EntityId, origin: Vec2) {
        let Some(delta) = self.logic(id).map(|logic| origin - logic.sprite().origin) else {
            return;
        };
        for logic in self.entities.iter_mut().flatten() {
            let sprite = logic.sprite_mut();
            if sprite.parent() == Some(id) {
                sprite.origin += delta;
            }
        }
        if let Some(logic) = self.entities.get_mut(id.0).and_then(|slot| slot.as_deref_mut()) {
            logic.sprite_mut().origin = origin;
        }
    }

    /// Kills an entity from outside the simulation step. It is removed on
    /// the next tick.
    pub fn kill(&mut self, world: &World, screen: Rect, id: EntityId) {
        let Some(logic) = self.entities.get_mut(id.0).and_then(|slot| slot.as_deref_mut()) else {
            return;
        };
        let mut ctx = SimContext {
            world,
            screen,
            entity: id,
            events: &mut self.events,
        };
        sprite::kill(logic, &mut ctx);
    }

    /// One simulation step: think and animate every live entity, move
    /// children with their parents, resolve shots against enemies, then drop
    /// everything killed during the step.
    pub fn tick(&mut self, world: &World, screen: Rect) {
        for (index, slot) in self.entities.iter_mut().enumerate() {
            let Some(logic) = slot.as_deref_mut() else {
                continue;
            };
            if logic.sprite().marked_to_remove() {
                continue;
            }
            logic.sprite_mut().begin_tick();
            let mut ctx = SimContext {
                world,
                screen,
                entity: EntityId(index),
                events: &mut self.events,
            };
            logic.think(&mut ctx);
            sprite::post_think(logic, &mut ctx);
        }

        self.follow_parents();
        self.resolve_shots(world, screen);
        self.drain_events();
        self.remove_dead(world, screen);
    }

    fn follow_parents(&mut self) {
        let deltas: HashMap<usize, Vec2> = self
            .entities
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((index, slot.as_ref()?.sprite().delta())))
            .filter(|(_, delta)| *delta != Vec2::ZERO)
            .collect();
        if deltas.is_empty() {
            return;
        }
        for logic in self.entities.iter_mut().flatten() {
            let sprite = logic.sprite_mut();
            if let Some(delta) = sprite.parent().and_then(|parent| deltas.get(&parent.0)) {
                sprite.origin += *delta;
            }
        }
    }

    fn resolve_shots(&mut self, world: &World, screen: Rect) {
        let lemons: Vec<EntityId> = self
            .ids()
            .filter(|&id| {
                self.get::<BusterLemon>(id)
                    .is_some_and(|lemon| !lemon.exploding() && !lemon.reflected() && !lemon.sprite().marked_to_remove())
            })
            .collect();
        let enemies: Vec<EntityId> = self
            .ids()
            .filter(|&id| self.get::<Enemy>(id).is_some())
            .collect();

        for lemon_id in lemons {
            let Some(shot_box) = self.logic(lemon_id).map(|logic| logic.collision_box()) else {
                continue;
            };
            let target = enemies.iter().copied().find(|&enemy_id| {
                self.get::<Enemy>(enemy_id).is_some_and(|enemy| {
                    !enemy.sprite().marked_to_remove()
                        && intersection_area(enemy.collision_box(), shot_box) > 0.0
                })
            });
            let Some(enemy_id) = target else {
                continue;
            };

            let reflects = self
                .get::<Enemy>(enemy_id)
                .is_some_and(|enemy| enemy.reflects_shots());
            if let Some(lemon) = self.get_mut::<BusterLemon>(lemon_id) {
                if reflects {
                    lemon.reflect();
                } else {
                    lemon.explode();
                }
            }
            if reflects {
                continue;
            }

            let killed = self
                .get_mut::<Enemy>(enemy_id)
                .is_some_and(|enemy| enemy.sprite_mut().hurt(1));
            if killed {
                log::debug!("{:?} destroyed by {:?}", enemy_id, lemon_id);
                self.kill(world, screen, enemy_id);
            }
        }
    }

    fn drain_events(&mut self) {
        for event in self.events.drain(..) {
            match event {
                SimEvent::ShotExpired { shooter } => {
                    if let Some(budget) = self.budgets.get_mut(&shooter) {
                        budget.live = budget.live.saturating_sub(1);
                    }
                }
            }
        }
    }

    fn remove_dead(&mut self, world: &World, screen: Rect) {
        let dead: Vec<EntityId> = self
            .ids()
            .filter(|&id| self.logic(id).is_some_and(|logic| logic.sprite().marked_to_remove()))
            .collect();
        if dead.is_empty() {
            return;
        }

        // Descendants go down with their ancestors, however deep.
        let mut frontier = dead;
        while !frontier.is_empty() {
            let orphans: Vec<EntityId> = self
                .ids()
                .filter(|&id| {
                    self.logic(id).is_some_and(|logic| {
                        !logic.sprite().marked_to_remove()
                            && logic.sprite().parent().is_some_and(|parent| frontier.contains(&parent))
                    })
                })
                .collect();
            for &id in &orphans {
                self.kill(world, screen, id);
            }
            frontier = orphans;
        }

        for id in self.ids().collect::<Vec<_>>() {
            if self.logic(id).is_some_and(|logic| logic.sprite().marked_to_remove()) {
                self.entities[id.0] = None;
                self.budgets.remove(&id);
            }
        }
        self.drain_events();
    }

    pub fn paint(&self, target: &mut dyn PaintTarget, view: Rect) {
        for logic in self.entities.iter().flatten() {
            logic.sprite().paint(target, view);
        }
    }
}
