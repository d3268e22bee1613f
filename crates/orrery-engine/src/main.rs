//! Headless demo: loads settings, builds a seeded universe and runs the frame
//! pipeline while the observer descends toward Earth.
//!
//! Run with `cargo run -p orrery-engine -- --depth-scaling log` to override
//! settings from the command line.

use clap::Parser;
use glam::DVec3;
use orrery_config::{CliArgs, Settings, default_config_dir};
use orrery_engine::demo::{EARTH_RADIUS, camera_above_earth, demo_universe};
use orrery_engine::{Engine, EngineError};
use orrery_lod::CubeSphereShape;
use orrery_math::units::J2000;
use orrery_patch::Projection;
use tracing::info;

const SEED: u64 = 42;
const STAR_COUNT: usize = 2000;
const FRAMES: u32 = 120;
const VIEWPORT_HEIGHT: u32 = 1080;
const START_ALTITUDE: f64 = 50_000.0;
const END_ALTITUDE: f64 = 50.0;
/// Simulated time per frame, in days.
const FRAME_DAYS: f64 = 1.0 / 1440.0;

fn main() {
    let args = CliArgs::parse();
    if let Err(err) = run(&args) {
        eprintln!("orrery: {err}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), EngineError> {
    let mut settings = match args.config.clone().or_else(default_config_dir) {
        Some(dir) => Settings::load_or_create(&dir)?,
        None => Settings::default(),
    };
    settings.apply_cli_overrides(args);
    settings.validate()?;
    orrery_log::init_logging(None, cfg!(debug_assertions), Some(&settings));

    let demo = demo_universe(SEED, STAR_COUNT)?;
    let camera = camera_above_earth(demo.earth, START_ALTITUDE, &settings.render, VIEWPORT_HEIGHT);
    let mut engine = Engine::new(demo.graph, camera, settings);
    engine.attach_surface(
        demo.earth,
        Box::new(CubeSphereShape::new(EARTH_RADIUS, Projection::ImprovedQcs)),
    )?;
    engine.set_star_temperature(demo.sun, 5772.0);
    for (star, temperature) in &demo.stars {
        engine.set_star_temperature(*star, *temperature);
    }

    // Geometric descent, so every LOD level gets a few frames.
    let ratio = (END_ALTITUDE / START_ALTITUDE).powf(1.0 / f64::from(FRAMES - 1));
    let mut altitude = START_ALTITUDE;
    for frame in 0..FRAMES {
        engine
            .camera_mut()
            .set_frame_position(DVec3::new(0.0, -(EARTH_RADIUS + altitude), 0.0));
        let report = engine.tick(J2000 + f64::from(frame) * FRAME_DAYS);
        if frame % 10 == 0 || frame + 1 == FRAMES {
            info!(
                frame,
                altitude,
                visible = report.visible,
                regions = report.regions,
                points = report.points,
                halos = report.halos,
                max_lod = report.max_lod,
                patches = report.patches_shown,
                "Frame"
            );
        }
        altitude *= ratio;
    }

    if let Some((system, distance)) = engine.closest_system() {
        let name = engine.graph().anchor(system)?.name.clone();
        info!(%system, name = %name, distance, "Closest system");
    }
    let casters = engine.shadow_casters(demo.moon, demo.sun)?;
    info!(count = casters.len(), "Shadow casters on the Moon");
    Ok(())
}
