pub mod behavior;
pub mod camera;
pub mod constants;
pub mod entity;
pub mod error;
pub mod material;
pub mod physics;
pub mod scene;
pub mod simulation;
pub mod world;

pub use constants::*;
pub use error::{PhysicsError, PhysicsResult};

/// Formats a millisecond clock as `HH:MM:SS.mmm`.
pub fn format_elapsed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
