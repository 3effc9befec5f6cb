use macroquad::prelude::*;
use std::rc::Rc;

use mmx_engine::animation::{FrameSequence, SpriteSheet};
use mmx_engine::collision::{CollisionData, CollisionFlags};
use mmx_engine::config::Layout;
use mmx_engine::direction::Direction;
use mmx_engine::enemy::{Enemy, EnemyDef};
use mmx_engine::entity::{EntityId, EntityList};
use mmx_engine::map::TileAttributes;
use mmx_engine::render::{PaintTarget, SpriteDraw, render_frame};
use mmx_engine::sprite::SpriteLogic;
use mmx_engine::tile::Tile;
use mmx_engine::weapon::BusterLemon;
use mmx_engine::world::World;

fn arena() -> World {
    let mut world = World::new(Layout::default(), 2, 4);
    world
        .add_rectangle(Rect::new(0.0, 48.0, 128.0, 16.0), WHITE, CollisionData::SOLID)
        .unwrap();
    world
}

fn target_def(health: u32, reflects_shots: bool) -> EnemyDef {
    let frame = Rect::new(-7.0, -7.0, 14.0, 15.0);
    let sheet = SpriteSheet::new("target")
        .with_sequence(FrameSequence::uniform("Idle", 1, frame, frame).looping_from(0));
    EnemyDef {
        id: "target".to_string(),
        name: "Target".to_string(),
        sheet: Rc::new(sheet),
        idle_sequence: "Idle".to_string(),
        contact_damage: 1,
        health,
        respawnable: false,
        reflects_shots,
        walk_speed: 0.0,
    }
}

struct Scene {
    world: World,
    entities: EntityList,
    shooter: EntityId,
    enemy: EntityId,
}

impl Scene {
    fn new(health: u32, reflects_shots: bool) -> Self {
        let world = arena();
        let mut entities = EntityList::default();
        let shooter = entities.spawn_charging_effect(None, vec2(20.0, 40.0));
        entities.register_shooter(shooter, 3);
        let enemy = entities.spawn_enemy(Enemy::new(
            target_def(health, reflects_shots),
            vec2(80.0, 40.0),
            Direction::LEFT,
        ));
        Self {
            world,
            entities,
            shooter,
            enemy,
        }
    }

    fn fire(&mut self) -> EntityId {
        self.entities
            .fire_lemon(self.shooter, vec2(20.0, 40.0), Direction::RIGHT, false)
            .unwrap()
    }

    fn tick(&mut self, count: usize) {
        for _ in 0..count {
            self.entities.tick(&self.world, self.world.bounds());
        }
    }
}

#[test]
fn enemy_rests_on_the_floor() {
    let mut scene = Scene::new(3, false);
    scene.tick(10);
    let enemy = scene.entities.get::<Enemy>(scene.enemy).unwrap();
    assert!(enemy.sprite().landed());
    assert_eq!(enemy.collision_box().bottom(), 48.0);
    assert!(
        scene
            .world
            .get_collision_flags(enemy.collision_box(), CollisionFlags::empty(), true)
            .flags
            .is_empty()
    );
}

#[test]
fn lemon_hits_once_then_explodes_and_frees_its_slot() {
    let mut scene = Scene::new(3, false);
    let lemon = scene.fire();
    scene.tick(12);

    assert_eq!(scene.entities.get::<Enemy>(scene.enemy).unwrap().sprite().health(), 2);
    let exploding = scene.entities.get::<BusterLemon>(lemon).unwrap();
    assert!(exploding.exploding());
    assert_eq!(exploding.sprite().vel, Vec2::ZERO);

    scene.tick(10);
    assert!(!scene.entities.contains(lemon));
    assert_eq!(scene.entities.get::<Enemy>(scene.enemy).unwrap().sprite().health(), 2);
    assert_eq!(scene.entities.shot_budget(scene.shooter).unwrap().live, 0);
}

#[test]
fn last_hit_removes_the_enemy() {
    let mut scene = Scene::new(1, false);
    scene.fire();
    scene.tick(12);
    assert!(!scene.entities.contains(scene.enemy));
}

#[test]
fn shielded_enemy_reflects_lemons() {
    let mut scene = Scene::new(3, true);
    let lemon = scene.fire();
    scene.tick(12);

    let reflected = scene.entities.get::<BusterLemon>(lemon).unwrap();
    assert!(reflected.reflected());
    assert!(reflected.sprite().vel.x < 0.0);
    assert!(reflected.sprite().vel.y < 0.0);
    assert_eq!(scene.entities.get::<Enemy>(scene.enemy).unwrap().sprite().health(), 3);
}

#[test]
fn the_shot_cap_holds_while_lemons_fly() {
    let mut scene = Scene::new(100, false);
    for _ in 0..3 {
        scene.fire();
    }
    assert!(
        scene
            .entities
            .fire_lemon(scene.shooter, vec2(20.0, 40.0), Direction::LEFT, true)
            .is_none()
    );
    scene.tick(40);
    assert_eq!(scene.entities.shot_budget(scene.shooter).unwrap().live, 0);
    assert!(scene.entities.fire_lemon(scene.shooter, vec2(20.0, 40.0), Direction::LEFT, true).is_some());
}

#[derive(Default)]
struct Log(Vec<String>);

impl PaintTarget for Log {
    fn draw_tile(&mut self, _tile: &Tile, _dest: Rect, attributes: TileAttributes) {
        self.0.push(if attributes.up_layer { "up" } else { "down" }.to_string());
    }

    fn clear_rect(&mut self, _rect: Rect) {
        self.0.push("clear".to_string());
    }

    fn draw_sprite(&mut self, sprite: &SpriteDraw) {
        self.0.push(format!("sprite:{}", sprite.name));
    }
}

#[test]
fn entities_are_painted_between_layers() {
    let layout = Layout {
        tile_size: 8,
        side_tiles_per_map: 1,
        side_maps_per_block: 1,
    };
    let mut world = World::new(layout, 1, 1);
    let tile = world.add_tile(vec![0; 8 * 8 * 4]);
    let map = world.set_tile(vec2(0.0, 0.0), tile).unwrap();
    let front = world.add_tile(vec![0; 8 * 8 * 4]);
    let front_map = world.add_map(CollisionData::NONE);
    world
        .map_mut(front_map)
        .unwrap()
        .set_tile_at(mmx_engine::cell::Cell::new(0, 0), Some(front), TileAttributes::UP_LAYER)
        .unwrap();
    assert_eq!(world.get_map_from(vec2(0.0, 0.0)), Some(map));
    world.set_map(vec2(0.0, 0.0), Some(front_map)).unwrap();
    let mut entities = EntityList::default();
    entities.spawn_charging_effect(None, vec2(4.0, 4.0));

    let mut log = Log::default();
    render_frame(&world, &entities, &mut log, Rect::new(0.0, 0.0, 8.0, 8.0));
    assert_eq!(log.0, vec!["sprite:charging", "up"]);

    world.set_map(vec2(0.0, 0.0), Some(map)).unwrap();
    let mut log = Log::default();
    render_frame(&world, &entities, &mut log, Rect::new(0.0, 0.0, 8.0, 8.0));
    assert_eq!(log.0, vec!["down", "sprite:charging"]);
}
