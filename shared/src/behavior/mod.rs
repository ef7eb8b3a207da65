//! Behaviors: per-entity hooks run by the simulation.
//!
//! A behavior may implement any subset of `init`, `update`, `draw` and
//! `dispose`; the rest default to no-ops. Lookup is done through a stable
//! [`BehaviorKind`] tag instead of runtime type inspection, and the one
//! behavior other systems need typed access to (the wave solver) is exposed
//! through the `as_wave` capability accessors.

pub mod input;
pub mod wave;

use bevy::color::Color;
use bevy::math::Vec2;

use crate::entity::Entity;
use crate::error::PhysicsResult;
use input::KeyInput;
use wave::WaveBehavior;

/// Stable identifier used by [`Entity::find_behavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorKind {
    PlayerInput,
    Wave,
    Custom(&'static str),
}

/// Renderer-agnostic primitive emitted by a behavior's `draw` hook.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawShape {
    Polygon { points: Vec<Vec2>, fill: Color },
    Line { from: Vec2, to: Vec2, color: Color },
}

pub trait Behavior: Send + Sync {
    fn kind(&self) -> BehaviorKind;

    /// Called once when the owning entity is registered. An error rejects
    /// the registration.
    fn init(&mut self, _entity: &Entity) -> PhysicsResult<()> {
        Ok(())
    }

    fn update(&mut self, _ctx: &mut UpdateContext) {}

    fn draw(&self, _entity: &Entity, _out: &mut Vec<DrawShape>) {}

    /// Called once when the owning entity leaves the simulation.
    fn dispose(&mut self, _entity: &Entity) {}

    fn as_wave(&self) -> Option<&WaveBehavior> {
        None
    }

    fn as_wave_mut(&mut self) -> Option<&mut WaveBehavior> {
        None
    }
}

/// Everything a behavior can see while it updates.
///
/// The owning entity is borrowed mutably with its behavior list detached;
/// every other entity of the simulation is readable through [`Self::others`].
pub struct UpdateContext<'a> {
    pub elapsed_ms: u64,
    /// Simulation clock in seconds, including this tick.
    pub time: f32,
    pub entity: &'a mut Entity,
    pub input: &'a dyn KeyInput,
    before: &'a [Entity],
    after: &'a [Entity],
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        elapsed_ms: u64,
        time: f32,
        entity: &'a mut Entity,
        input: &'a dyn KeyInput,
        before: &'a [Entity],
        after: &'a [Entity],
    ) -> Self {
        Self {
            elapsed_ms,
            time,
            entity,
            input,
            before,
            after,
        }
    }

    #[inline]
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_ms as f32 / 1000.0
    }

    /// All entities except the one being updated, in registration order.
    pub fn others(&self) -> impl Iterator<Item = &Entity> {
        self.before.iter().chain(self.after.iter())
    }
}

/// Wraps a closure as a stateless update-only behavior.
pub struct UpdateFn<F> {
    name: &'static str,
    update: F,
}

impl<F> UpdateFn<F>
where
    F: FnMut(&mut UpdateContext) + Send + Sync,
{
    pub fn new(name: &'static str, update: F) -> Self {
        Self { name, update }
    }
}

impl<F> Behavior for UpdateFn<F>
where
    F: FnMut(&mut UpdateContext) + Send + Sync,
{
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Custom(self.name)
    }

    fn update(&mut self, ctx: &mut UpdateContext) {
        (self.update)(ctx);
    }
}
