use macroquad::prelude::*;

use mmx_engine::config::EngineConfig;
use mmx_engine::consts::TICK;
use mmx_engine::direction::Direction;
use mmx_engine::effect::ChargingEffect;
use mmx_engine::enemy::EnemyDatabase;
use mmx_engine::entity::{EntityId, EntityList};
use mmx_engine::level::build_level;
use mmx_engine::render::{MacroquadTarget, render_frame};
use mmx_engine::world::World;

const CONFIG_PATH: &str = "assets/engine.yaml";
const ENEMY_DIR: &str = "assets/enemy";
const WINDOW_SCALE: f32 = 3.0;
const FIRE_INTERVAL: f32 = 0.3;
const CHARGE_INTERVAL: f32 = 1.5;
const MAX_TICKS_PER_FRAME: u32 = 5;

fn window_conf() -> Conf {
    Conf {
        window_title: "mmx-engine".to_owned(),
        window_width: (256.0 * WINDOW_SCALE) as i32,
        window_height: (224.0 * WINDOW_SCALE) as i32,
        sample_count: 1,
        ..Default::default()
    }
}

fn view_for(config: &EngineConfig, world: &World, focus: Vec2) -> Rect {
    let bounds = world.bounds();
    let size = vec2(config.screen[0], config.screen[1]);
    let left_top = vec2(
        (focus.x - size.x / 2.0).clamp(0.0, (bounds.w - size.x).max(0.0)),
        (focus.y - size.y / 2.0).clamp(0.0, (bounds.h - size.y).max(0.0)),
    );
    config.screen_box(left_top)
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EngineConfig::load(CONFIG_PATH).unwrap_or_else(|err| {
        log::warn!("config load failed: {err}, using defaults");
        EngineConfig::default()
    });
    let mut world = World::from_config(&config);
    if let Err(err) = build_level(&mut world) {
        log::warn!("level build failed: {err}");
    }

    let db = EnemyDatabase::load_from(ENEMY_DIR).unwrap_or_else(|err| {
        log::warn!("enemy load failed: {err}");
        EnemyDatabase::empty()
    });

    let mut entities = EntityList::default();
    let ground = world.bounds().bottom() - config.layout.map_size() as f32 * 2.0;
    let buster_origin = vec2(48.0, ground - 16.0);
    let shooter: EntityId = entities.spawn_charging_effect(None, buster_origin);
    entities.register_shooter(shooter, config.max_shots);

    for (id, x, facing) in [("met", 200.0, Direction::LEFT), ("shield", 320.0, Direction::LEFT)] {
        match db.spawn(id, vec2(x, ground - 32.0), facing) {
            Some(enemy) => {
                entities.spawn_enemy(enemy);
            }
            None => log::warn!("no enemy definition for {id}"),
        }
    }

    let mut target = MacroquadTarget::new(config.layout.tile_size);

    let mut accumulator = 0.0f32;
    let mut fire_timer = 0.0f32;
    let mut charge_timer = 0.0f32;
    let mut dash = false;

    loop {
        if is_key_pressed(KeyCode::F1) {
            target.debug_map_bounds = !target.debug_map_bounds;
        }

        let focus = entities.origin(shooter).unwrap_or(buster_origin);
        let view = view_for(&config, &world, focus);

        accumulator += get_frame_time();
        let mut ticks = 0;
        while accumulator >= TICK && ticks < MAX_TICKS_PER_FRAME {
            accumulator -= TICK;
            ticks += 1;

            fire_timer += TICK;
            if fire_timer >= FIRE_INTERVAL {
                fire_timer = 0.0;
                if entities.fire_lemon(shooter, focus, Direction::RIGHT, dash).is_some() {
                    dash = !dash;
                }
            }

            charge_timer += TICK;
            if charge_timer >= CHARGE_INTERVAL {
                charge_timer = 0.0;
                if let Some(effect) = entities.get_mut::<ChargingEffect>(shooter) {
                    let next = if effect.level() == 1 { 2 } else { 1 };
                    effect.set_level(next);
                }
            }

            entities.tick(&world, view);
        }
        if ticks == MAX_TICKS_PER_FRAME {
            accumulator = 0.0;
        }

        let camera = Camera2D {
            target: vec2(view.w / 2.0, view.h / 2.0),
            zoom: vec2(2.0 / view.w, 2.0 / view.h),
            ..Default::default()
        };
        set_camera(&camera);
        clear_background(BLACK);
        render_frame(&world, &entities, &mut target, view);

        set_default_camera();
        draw_text(
            &format!("FPS: {}  entities: {}", get_fps(), entities.len()),
            20.0,
            40.0,
            30.0,
            WHITE,
        );
        next_frame().await;
    }
}
