use std::fs;
use std::path::{Path, PathBuf};

use bevy_ecs::resource::Resource;
use bevy_log::info;
use ron::de::from_str;
use serde::{Deserialize, Serialize};
use shared::behavior::input::Key;
use shared::scene::SceneDescription;
use shared::TICKS_PER_SECOND;

/// One host-level command, either scripted or issued by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAction {
    Press(Key),
    Release(Key),
    TogglePause,
    ReverseGravity,
    ResetScene,
    CycleDebug,
    Exit,
}

/// Action fired once the loop clock reaches `at_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub at_ms: u64,
    pub action: ControlAction,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub tick_rate: u64,
    pub debug_level: u8,
    /// Stop after this many ticks.
    pub tick_limit: Option<u64>,
    /// Seed for every random wave source of the scene.
    pub seed: Option<u64>,
    pub viewport: (f32, f32),
    /// Period of the status line, in simulated milliseconds. 0 disables it.
    pub report_every_ms: u64,
    pub script: Vec<ScriptedEvent>,
    /// Scene to load instead of the built-in demo.
    pub scene: Option<SceneDescription>,
    /// Where to write a ron snapshot of the scene when the loop exits.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICKS_PER_SECOND,
            debug_level: 0,
            tick_limit: None,
            seed: None,
            viewport: (640.0, 400.0),
            report_every_ms: 1000,
            script: Vec::new(),
            scene: None,
            snapshot_path: None,
        }
    }
}

impl ServerConfig {
    /// Script entries ordered by time; entries sharing a timestamp keep
    /// their file order.
    pub fn sorted_script(&self) -> Vec<ScriptedEvent> {
        let mut script = self.script.clone();
        script.sort_by_key(|event| event.at_ms);
        script
    }

    pub fn tick_period_secs(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }
}

pub fn load_config(path: &Path) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!(
            "Config file not found: {}. Using default configuration.",
            path.display()
        );
        return Ok(ServerConfig::default());
    }

    let contents: String = fs::read_to_string(path)?;
    let config: ServerConfig = from_str(&contents)?;

    info!("Loaded config file from disk: {}", path.display());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(Path::new("/definitely/not/here/server.ron")).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: ServerConfig = from_str(
            r#"(
                tick_rate: 120,
                tick_limit: Some(600),
                script: [
                    (at_ms: 500, action: Release(Right)),
                    (at_ms: 100, action: Press(Right)),
                    (at_ms: 500, action: TogglePause),
                    (at_ms: 900, action: Exit),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(config.tick_rate, 120);
        assert_eq!(config.tick_limit, Some(600));
        assert_eq!(config.report_every_ms, 1000);
        assert!(config.scene.is_none());

        let script = config.sorted_script();
        assert_eq!(script[0].action, ControlAction::Press(Key::Right));
        assert_eq!(script[1].action, ControlAction::Release(Key::Right));
        assert_eq!(script[2].action, ControlAction::TogglePause);
        assert_eq!(script[3].action, ControlAction::Exit);
    }

    #[test]
    fn test_config_round_trip() {
        let config = ServerConfig {
            debug_level: 2,
            seed: Some(42),
            script: vec![ScriptedEvent {
                at_ms: 250,
                action: ControlAction::ReverseGravity,
            }],
            ..Default::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(from_str::<ServerConfig>(&text).unwrap(), config);
    }

    #[test]
    fn test_tick_period() {
        let config = ServerConfig {
            tick_rate: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_period_secs(), 1.0);
    }
}
