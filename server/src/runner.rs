//! Headless game loop: turns bevy frame time into simulation ticks, replays
//! the input script and reports progress.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use bevy::math::Vec2;
use bevy::time::Time;
use bevy_app::AppExit;
use bevy_ecs::event::EventWriter;
use bevy_ecs::resource::Resource;
use bevy_ecs::system::{Res, ResMut};
use bevy_log::{error, info};
use ron::ser::PrettyConfig;
use shared::behavior::input::KeyState;
use shared::format_elapsed;
use shared::scene::{self, SceneDescription};
use shared::simulation::Simulation;
use shared::PhysicsResult;

use crate::config::{ControlAction, ScriptedEvent, ServerConfig};

/// Highest debug level reachable with [`ControlAction::CycleDebug`].
pub const MAX_DEBUG_LEVEL: u8 = 5;

/// Host-side loop bookkeeping.
#[derive(Resource, Debug, Default)]
pub struct LoopState {
    pub paused: bool,
    /// Loop clock in milliseconds, advancing even while paused.
    pub clock_ms: u64,
    pub ticks: u64,
    /// Sub-millisecond remainder carried to the next frame.
    carry_ms: f64,
    next_report_ms: u64,
}

impl LoopState {
    /// Converts a frame duration to whole milliseconds, keeping the remainder.
    pub fn take_elapsed_ms(&mut self, delta_secs: f64) -> i64 {
        let total = delta_secs * 1000.0 + self.carry_ms;
        let whole = total.floor();
        self.carry_ms = total - whole;
        whole as i64
    }
}

/// Keys currently held by the script and the events still to come.
#[derive(Resource, Debug, Default)]
pub struct ScriptedInput {
    pub keys: KeyState,
    pending: VecDeque<ScriptedEvent>,
}

impl ScriptedInput {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            keys: KeyState::default(),
            pending: config.sorted_script().into(),
        }
    }

    /// Pops every event due at `clock_ms`, in order.
    pub fn due(&mut self, clock_ms: u64) -> Vec<ControlAction> {
        let mut actions = Vec::new();
        while self.pending.front().is_some_and(|e| e.at_ms <= clock_ms) {
            if let Some(event) = self.pending.pop_front() {
                actions.push(event.action);
            }
        }
        actions
    }
}

/// Rebuilds the configured scene, or the demo when none is configured.
pub fn load_scene(sim: &mut Simulation, config: &ServerConfig) -> PhysicsResult<()> {
    match &config.scene {
        Some(description) => {
            let description = match config.seed {
                Some(seed) => description.clone().with_seed(seed),
                None => description.clone(),
            };
            description.build(sim)
        }
        None => {
            let viewport = Vec2::new(config.viewport.0, config.viewport.1);
            scene::build_demo_with_seed(sim, viewport, config.seed).map(|_| ())
        }
    }
}

/// Applies one control action. Returns true when the loop must stop.
pub fn apply_action(
    action: ControlAction,
    sim: &mut Simulation,
    state: &mut LoopState,
    input: &mut ScriptedInput,
    config: &ServerConfig,
) -> bool {
    match action {
        ControlAction::Press(key) => input.keys.press(key),
        ControlAction::Release(key) => input.keys.release(key),
        ControlAction::TogglePause => {
            state.paused = !state.paused;
            info!("simulation {}", if state.paused { "paused" } else { "resumed" });
        }
        ControlAction::ReverseGravity => sim.reverse_gravity(),
        ControlAction::ResetScene => {
            input.keys.clear();
            if let Err(err) = load_scene(sim, config) {
                error!("Could not reset scene: {}", err);
                return true;
            }
            info!("scene reset");
        }
        ControlAction::CycleDebug => {
            sim.debug_level = (sim.debug_level + 1) % (MAX_DEBUG_LEVEL + 1);
            info!("debug level {}", sim.debug_level);
        }
        ControlAction::Exit => return true,
    }
    false
}

/// One frame of the loop. Returns true when the loop must stop.
pub fn advance(
    elapsed_ms: i64,
    sim: &mut Simulation,
    state: &mut LoopState,
    input: &mut ScriptedInput,
    config: &ServerConfig,
) -> bool {
    state.clock_ms += elapsed_ms.max(0) as u64;

    for action in input.due(state.clock_ms) {
        if apply_action(action, sim, state, input, config) {
            return true;
        }
    }

    if !state.paused {
        sim.step(elapsed_ms, &input.keys);
        state.ticks += 1;
        report(sim, state, config);
    }

    config.tick_limit.is_some_and(|limit| state.ticks >= limit)
}

fn report(sim: &Simulation, state: &mut LoopState, config: &ServerConfig) {
    if config.report_every_ms == 0 || sim.time_ms() < state.next_report_ms {
        return;
    }
    state.next_report_ms = sim.time_ms() + config.report_every_ms;
    for line in status_lines(sim, state) {
        info!("{}", line);
    }
}

/// Status line for the current tick, followed by one line per active entity
/// once the debug level reaches 2.
pub fn status_lines(sim: &Simulation, state: &LoopState) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] tick {} | {} entities | gravity {:?}",
        format_elapsed(sim.time_ms()),
        state.ticks,
        sim.entities().len(),
        sim.world().gravity
    )];
    if sim.debug_level >= 2 {
        lines.extend(
            sim.active_entities()
                .map(|entity| entity.debug_info().join(" | ")),
        );
    }
    lines
}

pub fn tick_system(
    time: Res<Time>,
    config: Res<ServerConfig>,
    mut sim: ResMut<Simulation>,
    mut state: ResMut<LoopState>,
    mut input: ResMut<ScriptedInput>,
    mut exit: EventWriter<AppExit>,
) {
    let elapsed_ms = state.take_elapsed_ms(time.delta().as_secs_f64());
    if advance(elapsed_ms, &mut sim, &mut state, &mut input, &config) {
        info!(
            "Stopping after {} ticks at {}",
            state.ticks,
            format_elapsed(sim.time_ms())
        );
        if let Some(path) = &config.snapshot_path {
            match save_snapshot(&sim, path) {
                Ok(()) => info!("Scene snapshot written to {}", path.display()),
                Err(err) => error!("Could not write snapshot {} : {}", path.display(), err),
            }
        }
        exit.write(AppExit::Success);
    }
}

pub fn save_snapshot(sim: &Simulation, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(4)
        .with_separate_tuple_members(true)
        .with_enumerate_arrays(false);

    let serialized = ron::ser::to_string_pretty(&SceneDescription::capture(sim), pretty_config)?;
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    Ok(())
}
