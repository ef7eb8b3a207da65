//! Forces exerted by fluid bodies and per-entity submersion bookkeeping.
//!
//! Buoyancy follows Archimedes with a fixed estimated thickness turning the
//! 2D submerged area into a volume. When the fluid carries a wave surface the
//! submerged area is integrated over vertical slices so the body feels the
//! local water level instead of the flat top edge.

use std::collections::HashMap;

use bevy::math::Vec2;

use super::collision::intersection_area;
use crate::constants::fluid::*;
use crate::constants::MIN_DRAG_SPEED;
use crate::entity::{Entity, EntityId};

/// Overlap area of `entity` with the fluid, following the wave surface if any.
pub fn submerged_area(entity: &Entity, fluid: &Entity) -> f32 {
    let flat = intersection_area(&entity.bounds(), &fluid.bounds());
    let Some(wave) = fluid.wave() else {
        return flat;
    };
    if wave.surface_points().is_empty() || entity.size.x <= 0.0 {
        return flat;
    }

    let cell_size = wave.cell_size();
    let samples = ((entity.size.x / cell_size).ceil() as usize).max(MIN_SURFACE_SAMPLES);
    let slice_width = entity.size.x / samples as f32;
    // Row 0 is pinned to zero, the first interior row carries the free surface.
    let surface_row = fluid.top() + cell_size;

    let mut area = 0.0;
    for i in 0..samples {
        let x = entity.left() + i as f32 * slice_width;
        if x < fluid.left() || x >= fluid.right() {
            continue;
        }
        let fluid_top = wave.base_level() + wave.get_wave_height_at(x, surface_row);
        let top = entity.top().max(fluid_top);
        let bottom = entity.bottom().min(fluid.bottom());
        if bottom > top {
            area += slice_width * (bottom - top);
        }
    }
    area
}

/// Archimedes force for a submerged area, opposing gravity and capped at
/// 1.5 times the body's weight.
pub fn buoyancy_force(submerged_area: f32, fluid_density: f32, mass: f32, gravity: Vec2) -> Vec2 {
    if submerged_area <= 0.0 {
        return Vec2::ZERO;
    }
    let g = gravity.y.abs();
    let volume = submerged_area * ESTIMATED_THICKNESS;
    let magnitude = (fluid_density * volume * g * VOLUME_TO_FORCE_SCALE).min(MAX_BUOYANCY_WEIGHT_RATIO * mass * g);
    Vec2::new(0.0, -gravity.y.signum() * magnitude)
}

/// Fraction of the entity's box inside the fluid's box, in `0.0..=1.0`.
pub fn submersion_ratio(entity: &Entity, fluid: &Entity) -> f32 {
    let area = entity.area();
    if area <= 0.0 {
        return 0.0;
    }
    (intersection_area(&entity.bounds(), &fluid.bounds()) / area).min(1.0)
}

/// Viscous drag opposing the velocity, proportional to speed and submersion.
pub fn drag_force(entity: &Entity, fluid: &Entity) -> Vec2 {
    let ratio = submersion_ratio(entity, fluid);
    if ratio <= 0.0 {
        return Vec2::ZERO;
    }
    let speed = entity.velocity.length();
    if speed < MIN_DRAG_SPEED {
        return Vec2::ZERO;
    }
    let magnitude = DRAG_COEFFICIENT * (1.0 - fluid.material().viscosity()) * ratio * speed;
    -entity.velocity / speed * magnitude
}

/// Extra damping while a body straddles the surface, which stops floating
/// bodies from bobbing forever.
pub fn surface_damping(entity: &Entity, fluid: &Entity) -> Vec2 {
    let ratio = submersion_ratio(entity, fluid);
    let (low, high) = SURFACE_DAMPING_RANGE;
    if ratio > low && ratio < high {
        -entity.velocity * SURFACE_DAMPING_FACTOR
    } else {
        Vec2::ZERO
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmersionState {
    pub max_ratio: f32,
    pub previous_ratio: f32,
    pub was_fully_submerged: bool,
    pub is_rising: bool,
    pub rise_start_ms: u64,
    /// Duration of the last rise from full submersion to the surface.
    pub emergence_time_ms: Option<u64>,
}

/// Submersion history of every entity that has touched a fluid.
#[derive(Debug, Clone, Default)]
pub struct SubmersionTracker {
    states: HashMap<EntityId, SubmersionState>,
}

impl SubmersionTracker {
    /// Feeds one observation. `rising_speed` is the velocity component
    /// against gravity, `now_ms` the simulation clock.
    pub fn record(&mut self, id: EntityId, ratio: f32, rising_speed: f32, now_ms: u64) {
        let state = self.states.entry(id).or_insert_with(|| SubmersionState {
            max_ratio: ratio,
            previous_ratio: ratio,
            rise_start_ms: now_ms,
            ..Default::default()
        });

        state.max_ratio = state.max_ratio.max(ratio);
        if ratio >= FULLY_SUBMERGED_RATIO {
            state.was_fully_submerged = true;
        }
        if !state.is_rising && state.was_fully_submerged && rising_speed > RISING_SPEED {
            state.is_rising = true;
            state.rise_start_ms = now_ms;
        }
        if state.is_rising && ratio <= EMERGED_RATIO {
            state.is_rising = false;
            state.emergence_time_ms = Some(now_ms.saturating_sub(state.rise_start_ms));
            log::debug!("{} emerged after {} ms", id, now_ms.saturating_sub(state.rise_start_ms));
        }
        state.previous_ratio = ratio;
    }

    pub fn get(&self, id: EntityId) -> Option<&SubmersionState> {
        self.states.get(&id)
    }

    pub fn remove(&mut self, id: EntityId) {
        self.states.remove(&id);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::wave::{WaveBehavior, WaveConfig};
    use crate::behavior::Behavior;
    use crate::entity::PhysicsKind;
    use crate::material::WATER;
    use std::sync::Arc;

    fn pool() -> Entity {
        Entity::new("pool")
            .with_position(0.0, 100.0)
            .with_size(200.0, 100.0)
            .with_kind(PhysicsKind::Static)
            .with_material(Arc::clone(&WATER))
    }

    #[test]
    fn test_no_force_outside_fluid() {
        let fluid = pool();
        let body = Entity::new("b")
            .with_position(10.0, 20.0)
            .with_size(10.0, 10.0)
            .with_velocity(3.0, 4.0);
        assert_eq!(submerged_area(&body, &fluid), 0.0);
        assert_eq!(buoyancy_force(0.0, 1000.0, 1.0, Vec2::new(0.0, 9.8)), Vec2::ZERO);
        assert_eq!(drag_force(&body, &fluid), Vec2::ZERO);
        assert_eq!(surface_damping(&body, &fluid), Vec2::ZERO);
    }

    #[test]
    fn test_buoyancy_opposes_gravity_and_is_capped() {
        let up = buoyancy_force(100.0, 1000.0, 60.0, Vec2::new(0.0, 294.3));
        assert!((up.y + 0.1 * 100.0 * 294.3).abs() < 1e-2);
        let down = buoyancy_force(100.0, 1000.0, 60.0, Vec2::new(0.0, -294.3));
        assert!(down.y > 0.0);

        let capped = buoyancy_force(1e6, 1000.0, 2.0, Vec2::new(0.0, 10.0));
        assert!((capped.y + 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_drag_and_damping() {
        let fluid = pool();
        let body = Entity::new("b")
            .with_position(10.0, 95.0)
            .with_size(10.0, 10.0)
            .with_velocity(0.0, 10.0);
        // half submerged
        let drag = drag_force(&body, &fluid);
        assert!((drag.y + 2.0 * 0.9 * 0.5 * 10.0).abs() < 1e-4);
        assert_eq!(surface_damping(&body, &fluid), Vec2::new(0.0, -5.0));

        let still = Entity::new("s").with_position(10.0, 95.0).with_size(10.0, 10.0);
        assert_eq!(drag_force(&still, &fluid), Vec2::ZERO);
    }

    #[test]
    fn test_flat_wave_matches_box_overlap() {
        let mut fluid = pool();
        let mut wave = WaveBehavior::new(WaveConfig {
            initial_noise: 0.0,
            ..Default::default()
        });
        wave.init(&fluid).unwrap();
        fluid = fluid.with_behavior(wave);

        let body = Entity::new("b").with_position(20.0, 90.0).with_size(20.0, 20.0);
        let area = submerged_area(&body, &fluid);
        assert!((area - 200.0).abs() < 1e-3, "area={area}");
    }

    #[test]
    fn test_slices_outside_fluid_are_ignored() {
        let mut fluid = pool();
        let mut wave = WaveBehavior::new(WaveConfig {
            initial_noise: 0.0,
            ..Default::default()
        });
        wave.init(&fluid).unwrap();
        fluid = fluid.with_behavior(wave);

        // half of the body hangs past the left edge
        let body = Entity::new("b").with_position(-10.0, 150.0).with_size(20.0, 20.0);
        let area = submerged_area(&body, &fluid);
        assert!((area - 200.0).abs() < 1e-3, "area={area}");
    }

    #[test]
    fn test_submersion_tracking() {
        let id = EntityId(3);
        let mut tracker = SubmersionTracker::default();
        tracker.record(id, 0.5, 0.0, 0);
        tracker.record(id, 1.0, 0.0, 100);
        assert!(tracker.get(id).unwrap().was_fully_submerged);

        tracker.record(id, 0.9, 12.0, 200);
        assert!(tracker.get(id).unwrap().is_rising);

        tracker.record(id, 0.005, 12.0, 950);
        let state = tracker.get(id).unwrap();
        assert!(!state.is_rising);
        assert_eq!(state.emergence_time_ms, Some(750));
        assert_eq!(state.max_ratio, 1.0);

        tracker.remove(id);
        assert!(tracker.get(id).is_none());
    }
}
