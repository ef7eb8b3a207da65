use std::time::Duration;

use bevy::prelude::*;
use bevy_app::ScheduleRunnerPlugin;
use bevy_log::{error, info, Level, LogPlugin};
use shared::simulation::Simulation;
use shared::world::World as SimWorld;

use crate::config::ServerConfig;
use crate::runner::{self, LoopState, ScriptedInput};

pub fn init(config: ServerConfig) {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            config.tick_period_secs(),
        ))),
    );

    app.add_plugins(LogPlugin {
        level: if config.debug_level > 0 {
            Level::DEBUG
        } else {
            Level::INFO
        },
        ..Default::default()
    });

    let mut sim = Simulation::new(SimWorld::new("empty", 0.0, 0.0));
    sim.debug_level = config.debug_level;
    if let Err(err) = runner::load_scene(&mut sim, &config) {
        error!("Failed to build the scene : {}", err);
        return;
    }

    info!(
        "Starting simulation of '{}' with {} entities at {} ticks per second",
        sim.world().name,
        sim.entities().len(),
        config.tick_rate
    );

    app.insert_resource(ScriptedInput::new(&config));
    app.insert_resource(LoopState::default());
    app.insert_resource(sim);
    app.insert_resource(config);

    app.add_systems(Update, runner::tick_system);

    app.run();
}
