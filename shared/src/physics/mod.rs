pub mod collision;
pub mod fluid;

use std::sync::Arc;

use bevy::math::Vec2;

use crate::constants::MAX_SPEED;
use crate::entity::{Entity, PhysicsKind};
use crate::material::Material;
use crate::world::World;
use fluid::SubmersionTracker;

/// Every entity of the simulation except the one being integrated.
#[derive(Clone, Copy)]
pub struct Neighbors<'a> {
    before: &'a [Entity],
    after: &'a [Entity],
}

impl<'a> Neighbors<'a> {
    pub fn new(before: &'a [Entity], after: &'a [Entity]) -> Self {
        Self { before, after }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Entity> + '_ {
        self.before.iter().chain(self.after.iter())
    }

    /// Active fluid bodies overlapping `entity`.
    pub fn fluids_touching(&self, entity: &Entity) -> Vec<&'a Entity> {
        self.iter()
            .filter(|other| other.active && other.is_fluid() && entity.intersects(other))
            .collect()
    }
}

/// Friction of the slipperiest contacted material, or the fallback when
/// nothing is touched.
pub fn combined_friction(materials: &[&Material], fallback: &Material) -> f32 {
    materials
        .iter()
        .map(|m| m.friction())
        .reduce(f32::min)
        .unwrap_or_else(|| fallback.friction())
}

/// Shared per-tick inputs of the integrator.
pub struct TickContext<'a> {
    pub world: &'a World,
    pub elapsed_ms: u64,
    /// Simulation clock after this tick, milliseconds.
    pub now_ms: u64,
}

impl TickContext<'_> {
    #[inline]
    pub fn dt(&self) -> f32 {
        self.elapsed_ms as f32 / 1000.0
    }
}

/// Advances one dynamic entity by one tick.
///
/// Gravity, fluid forces and queued forces update the velocity, which is
/// capped at [`MAX_SPEED`] before moving the body. The body is then pushed
/// out of static solids and slowed by the friction of whatever it touches.
/// `on_ground` must already have been reset by the caller, before behaviors ran.
pub fn integrate(entity: &mut Entity, neighbors: Neighbors, tick: &TickContext, submersion: &mut SubmersionTracker) {
    let dt = tick.dt();
    let gravity = tick.world.gravity;

    let fluids = neighbors.fluids_touching(entity);

    entity.velocity += gravity * dt;

    if entity.area() > 0.0 {
        for fluid_body in &fluids {
            let area = fluid::submerged_area(entity, fluid_body);
            if area > 0.0 {
                let ratio = (area / entity.area()).min(1.0);
                let rising_speed = -entity.velocity.y * gravity.y.signum();
                submersion.record(entity.id(), ratio, rising_speed, tick.now_ms);
                let density = fluid_body.material().density();
                let buoyancy = fluid::buoyancy_force(area, density, entity.mass(), gravity);
                entity.apply_force(buoyancy);
            }
            let drag = fluid::drag_force(entity, fluid_body);
            let damping = fluid::surface_damping(entity, fluid_body);
            entity.apply_force(drag);
            entity.apply_force(damping);
        }
    }

    let mass = entity.mass();
    let acceleration: Vec2 = entity.forces().iter().map(|force| *force / mass).sum();
    entity.velocity += acceleration * dt;
    entity.velocity = entity.velocity.clamp_length_max(MAX_SPEED);

    entity.position += entity.velocity * dt;

    let mut contacts: Vec<Arc<Material>> = Vec::new();
    for solid in neighbors.iter() {
        if !solid.active || solid.kind != PhysicsKind::Static || solid.is_fluid() {
            continue;
        }
        if entity.intersects(solid) {
            contacts.push(Arc::clone(solid.material()));
            collision::resolve_collision(entity, solid);
        }
    }
    // Fluids never block, but their friction still counts.
    contacts.extend(
        neighbors
            .fluids_touching(entity)
            .into_iter()
            .map(|f| Arc::clone(f.material())),
    );

    entity.rotation += entity.angular_velocity * dt;

    let materials: Vec<&Material> = contacts.iter().map(|m| &**m).collect();
    let friction = combined_friction(&materials, tick.world.material());
    entity.velocity *= friction;
    entity.angular_velocity *= friction;
}
