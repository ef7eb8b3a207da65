//! Simulated bodies.
//!
//! Entities are plain data owned by the [`Simulation`](crate::simulation::Simulation)
//! arena. Positions are top-left corners in a y-down coordinate system.

use std::fmt;
use std::sync::Arc;

use bevy::color::Color;
use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::behavior::{wave::WaveBehavior, Behavior, BehaviorKind};
use crate::constants::MIN_MASS;
use crate::material::{self, Material};

/// Stable handle of an entity inside one simulation. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhysicsKind {
    /// Integrated every tick, collides with statics.
    #[default]
    Dynamic,
    /// Never moves, other bodies collide against it.
    Static,
    /// Ignored by the integrator.
    None,
}

pub struct Entity {
    pub(crate) id: EntityId,
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    pub angular_velocity: f32,
    pub velocity: Vec2,
    mass: f32,
    material: Arc<Material>,
    pub kind: PhysicsKind,
    pub active: bool,
    pub jump: bool,
    pub on_ground: bool,
    pub color: Option<Color>,
    pub fill_color: Option<Color>,
    forces: Vec<Vec2>,
    /// Solid contact bits, see [`crate::constants::contact`].
    contact: u8,
    /// World boundary bits, see [`crate::constants::boundary`].
    boundary_contact: u8,
    pub(crate) behaviors: Vec<Box<dyn Behavior>>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
}

impl Entity {
    /// Creates an unregistered entity. Its id is assigned by `Simulation::spawn`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId(u64::MAX),
            name: name.into(),
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            velocity: Vec2::ZERO,
            mass: 1.0,
            material: Arc::clone(&material::DEFAULT),
            kind: PhysicsKind::Dynamic,
            active: true,
            jump: false,
            on_ground: false,
            color: Some(Color::BLACK),
            fill_color: Some(Color::srgb(1.0, 0.0, 0.0)),
            forces: Vec::new(),
            contact: 0,
            boundary_contact: 0,
            behaviors: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width.max(0.0), height.max(0.0));
        self
    }

    pub fn with_velocity(mut self, dx: f32, dy: f32) -> Self {
        self.velocity = Vec2::new(dx, dy);
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.set_mass(mass);
        self
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = material;
        self
    }

    pub fn with_kind(mut self, kind: PhysicsKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Sets the mass, never below [`MIN_MASS`]. NaN is treated as the minimum.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = if mass.is_nan() { MIN_MASS } else { mass.max(MIN_MASS) };
    }

    #[inline]
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = material;
    }

    #[inline]
    pub fn is_fluid(&self) -> bool {
        self.material.is_fluid()
    }

    #[inline]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    // ------------------------------------------------------------------
    // Forces and contacts
    // ------------------------------------------------------------------

    /// Queues a force for this tick. It only affects velocity at integration.
    pub fn apply_force(&mut self, force: Vec2) {
        if force.is_finite() {
            self.forces.push(force);
        }
    }

    pub fn forces(&self) -> &[Vec2] {
        &self.forces
    }

    pub fn reset_forces(&mut self) {
        self.forces.clear();
    }

    #[inline]
    pub fn contact(&self) -> u8 {
        self.contact
    }

    #[inline]
    pub fn boundary_contact(&self) -> u8 {
        self.boundary_contact
    }

    pub(crate) fn add_contact(&mut self, bit: u8) {
        self.contact |= bit;
    }

    pub(crate) fn add_boundary_contact(&mut self, bit: u8) {
        self.boundary_contact |= bit;
    }

    pub(crate) fn reset_contacts(&mut self) {
        self.contact = 0;
        self.boundary_contact = 0;
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.position, self.position + self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.size / 2.0
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    /// Strict AABB overlap: touching edges do not intersect.
    pub fn intersects(&self, other: &Entity) -> bool {
        crate::physics::collision::aabb_intersects(&self.bounds(), &other.bounds())
    }

    /// True when position and velocity hold only finite numbers.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.rotation.is_finite()
    }

    // ------------------------------------------------------------------
    // Behaviors
    // ------------------------------------------------------------------

    /// First attached behavior advertising `kind`.
    pub fn find_behavior(&self, kind: BehaviorKind) -> Option<&dyn Behavior> {
        self.behaviors
            .iter()
            .find(|b| b.kind() == kind)
            .map(|b| &**b)
    }

    pub fn find_behavior_mut(&mut self, kind: BehaviorKind) -> Option<&mut Box<dyn Behavior>> {
        self.behaviors.iter_mut().find(|b| b.kind() == kind)
    }

    pub fn behaviors(&self) -> impl Iterator<Item = &dyn Behavior> {
        self.behaviors.iter().map(|b| &**b)
    }

    pub fn wave(&self) -> Option<&WaveBehavior> {
        self.behaviors.iter().find_map(|b| b.as_wave())
    }

    pub fn wave_mut(&mut self) -> Option<&mut WaveBehavior> {
        self.behaviors.iter_mut().find_map(|b| b.as_wave_mut())
    }

    pub(crate) fn take_behaviors(&mut self) -> Vec<Box<dyn Behavior>> {
        std::mem::take(&mut self.behaviors)
    }

    /// Puts detached behaviors back in front of any added meanwhile.
    pub(crate) fn restore_behaviors(&mut self, mut behaviors: Vec<Box<dyn Behavior>>) {
        behaviors.append(&mut self.behaviors);
        self.behaviors = behaviors;
    }

    // ------------------------------------------------------------------
    // Debug output
    // ------------------------------------------------------------------

    pub fn debug_info(&self) -> Vec<String> {
        vec![
            format!("id: {}", self.id.0),
            format!("name: {}", self.name),
            format!("gnd:{}", self.on_ground),
            format!("cnt:{}", self.contact),
            format!("bnd:{}", self.boundary_contact),
            format!("jmp:{}", self.jump),
            format!("s: {:3.2}x{:3.2}", self.size.x, self.size.y),
            format!("p: {:3.2},{:3.2}", self.position.x, self.position.y),
            format!("r: {:3.2}", self.rotation),
            format!("v: {:3.2},{:3.2}", self.velocity.x, self.velocity.y),
            format!("dr: {:3.2}", self.angular_velocity),
        ]
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("velocity", &self.velocity)
            .field("mass", &self.mass)
            .field("material", &self.material.name)
            .field("kind", &self.kind)
            .field("active", &self.active)
            .field(
                "behaviors",
                &self.behaviors.iter().map(|b| b.kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Entity {
        Entity::new("box").with_position(x, y).with_size(w, h)
    }

    #[test]
    fn test_mass_never_below_minimum() {
        for input in [-100.0, -0.5, 0.0, 0.05, 0.1, f32::NAN, f32::NEG_INFINITY] {
            let e = Entity::new("m").with_mass(input);
            assert!(e.mass() >= MIN_MASS, "mass {} from input {}", e.mass(), input);
        }
        assert_eq!(Entity::new("m").with_mass(70.0).mass(), 70.0);
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let samples = [
            boxed(0.0, 0.0, 10.0, 10.0),
            boxed(5.0, 5.0, 10.0, 10.0),
            boxed(10.0, 0.0, 10.0, 10.0),
            boxed(-20.0, -20.0, 5.0, 5.0),
            boxed(2.0, 2.0, 1.0, 1.0),
            boxed(0.0, 9.5, 30.0, 0.0),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(a.intersects(b), b.intersects(a));
            }
        }
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = boxed(0.0, 0.0, 10.0, 10.0);
        let b = boxed(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = boxed(9.9, 0.0, 10.0, 10.0);
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_forces_accumulate_until_reset() {
        let mut e = Entity::new("f");
        e.apply_force(Vec2::new(1.0, 0.0));
        e.apply_force(Vec2::new(0.0, -2.0));
        e.apply_force(Vec2::new(f32::NAN, 0.0));
        assert_eq!(e.forces().len(), 2);
        e.reset_forces();
        assert!(e.forces().is_empty());
    }

    #[test]
    fn test_debug_info_reports_state() {
        let e = boxed(12.0, 34.0, 24.0, 32.0).with_velocity(1.5, -2.0);
        let info = e.debug_info();
        assert!(info.contains(&"p: 12.00,34.00".to_string()));
        assert!(info.contains(&"v: 1.50,-2.00".to_string()));
        assert!(info.contains(&"s: 24.00x32.00".to_string()));
    }
}
