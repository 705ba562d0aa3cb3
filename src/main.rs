//! Headless demo: a bouncing fountain and a depth-sorted cloud
//!
//! Usage: `glitter [scenario.ron]`

use std::sync::Arc;
use std::time::Duration;

use glitter::prelude::*;
use serde::Deserialize;

/// Demo settings, optionally loaded from a RON file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Scenario {
    system: SystemConfig,
    tick_rate: u32,
    frame_rate: u32,
    seconds: u32,
    fountain_rate: usize,
    gravity: f64,
    bounciness: f64,
    friction: f64,
    damping: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            system: SystemConfig::default().with_max_particles(2000),
            tick_rate: TickClock::DEFAULT_TICK_RATE,
            frame_rate: 60,
            seconds: 10,
            fountain_rate: 20,
            gravity: 0.02,
            bounciness: 0.8,
            friction: 0.02,
            damping: 0.01,
        }
    }
}

/// Demo with a physics fountain and a depth-sorted cloud
struct Demo {
    fountain: ParticleSystem,
    cloud: ParticleSystem,
    spawn_count: usize,
}

impl Demo {
    fn new(scenario: &Scenario) -> Result<Self> {
        let fountain = Self::fountain(scenario)?;
        let cloud = Self::cloud(scenario)?;
        let spawn_count = fountain.adjust_particle_count(scenario.fountain_rate);
        Ok(Self {
            fountain,
            cloud,
            spawn_count,
        })
    }

    fn fountain(scenario: &Scenario) -> Result<ParticleSystem> {
        let mut builder = ParticleSystem::builder();
        let position = builder.bind_named("position", 3);
        let previous_position = builder.bind_named("previous_position", 3);
        let velocity = builder.bind_named("velocity", 3);
        let color = builder.bind_named("color", 4);

        let physics = BasicPhysicsUpdateModule::new(position, velocity)?
            .with_previous_position(previous_position)?
            .with_gravity(ConstantBinding::scalar(scenario.gravity))?
            .with_bounciness(ConstantBinding::scalar(scenario.bounciness))?
            .with_friction(ConstantBinding::scalar(scenario.friction))?
            .with_damping(ConstantBinding::scalar(scenario.damping))?
            .with_world(Arc::new(BoxWorld::ground(0.0)));

        let sprites = SpriteRenderModule::new(
            SpriteMaterial::new("textures/glow.png")
                .with_blend(BlendMode::Additive)
                .with_write_depth(false)
                .with_blur(true),
            position,
            previous_position,
            color,
            ConstantBinding::scalar(0.2),
        )?;

        builder
            .config(scenario.system.clone())
            .add_update_module(physics)
            .add_render_module(sprites);
        builder.build()
    }

    fn cloud(scenario: &Scenario) -> Result<ParticleSystem> {
        let mut builder = ParticleSystem::builder();
        let position = builder.bind_named("position", 3);
        let color = builder.bind_named("color", 4);
        let depth = builder.bind_named("depth", 1);
        let sprite = builder.bind_named("sprite", 1);

        let sort = DepthSortModule::new(position, depth, ConstantBinding::new([0.0, 2.0, 10.0]))?;
        let sprites = SpriteRenderModule::new(
            SpriteMaterial::new("textures/cloud.png"),
            position,
            position,
            color,
            ConstantBinding::scalar(1.0),
        )?
        .with_sprite_sheet(2, sprite)?;

        builder
            .config(scenario.system.clone())
            .add_global_update_module(sort)
            .add_render_module(sprites);
        builder.build()
    }

    fn spawn(&mut self) -> Result<()> {
        for _ in 0..self.spawn_count {
            let angle = rand_f64() * std::f64::consts::TAU;
            let speed = 0.1 + rand_f64() * 0.1;
            let origin = [0.0, 0.5, 0.0];
            self.fountain.add_particle(
                200,
                &[
                    // position
                    origin[0],
                    origin[1],
                    origin[2],
                    // previous position
                    origin[0],
                    origin[1],
                    origin[2],
                    // velocity
                    angle.cos() * speed,
                    0.4,
                    angle.sin() * speed,
                    // color
                    rand_f64(),
                    rand_f64(),
                    rand_f64(),
                    1.0,
                ],
            )?;
        }

        if self.cloud.len() < 5 {
            self.cloud.add_particle(
                2000,
                &[
                    (rand_f64() - 0.5) * 6.0,
                    2.0 + (rand_f64() - 0.5) * 6.0,
                    (rand_f64() - 0.5) * 6.0,
                    rand_f64(),
                    rand_f64(),
                    rand_f64(),
                    0.6,
                    0.0,
                    rand_f64() * 4.0,
                ],
            )?;
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        self.spawn()?;
        self.fountain.tick()?;
        self.cloud.tick()
    }

    fn render(&self, partial_tick: f32, buffer: &mut QuadBuffer) -> Result<()> {
        buffer.clear();
        // Sorted cloud goes last
        self.fountain.render(partial_tick, buffer)?;
        self.cloud.render(partial_tick, buffer)
    }
}

/// Simple pseudo-random (deterministic across runs)
fn rand_f64() -> f64 {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u32> = const { Cell::new(12345) };
    }

    SEED.with(|seed| {
        let mut s = seed.get();
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        seed.set(s);
        f64::from(s) / f64::from(u32::MAX)
    })
}

fn load_scenario() -> Result<Scenario> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(Scenario::default());
    };
    log::info!("Loading scenario from {path}");
    let text = std::fs::read_to_string(&path)
        .map_err(|e| ParticleError::Config(format!("{path}: {e}")))?;
    Ok(ron::from_str(&text)?)
}

fn run() -> Result<()> {
    let scenario = load_scenario()?;
    let mut demo = Demo::new(&scenario)?;
    let mut clock = TickClock::new(scenario.tick_rate);
    let mut buffer = QuadBuffer::new(Billboard::look_at(
        Vec3::new(0.0, 2.0, 10.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::Y,
    ));

    let frame_rate = scenario.frame_rate.max(1);
    let frame_time = Duration::from_secs(1) / frame_rate;
    let frames = scenario.seconds * frame_rate;

    for frame in 1..=frames {
        for _ in 0..clock.advance(frame_time) {
            demo.tick()?;
        }
        demo.render(clock.partial_tick(), &mut buffer)?;

        if frame % frame_rate == 0 {
            log::info!(
                "t={}s ticks={} fountain={} cloud={} quads={} batches={}",
                frame / frame_rate,
                clock.total_ticks(),
                demo.fountain.len(),
                demo.cloud.len(),
                buffer.quad_count(),
                buffer.batches().len()
            );
        }
    }

    let stats = demo.fountain.stats();
    log::info!(
        "Fountain finished: spawned={} expired={} dropped={}",
        stats.spawned,
        stats.expired,
        stats.dropped
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}
