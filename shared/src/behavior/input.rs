//! Key-state queries and the player thrust behavior.

use std::collections::HashSet;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorKind, UpdateContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
}

/// Key predicate supplied by whatever input layer hosts the simulation.
pub trait KeyInput {
    fn is_pressed(&self, key: Key) -> bool;
}

/// Input source with nothing pressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl KeyInput for NoInput {
    fn is_pressed(&self, _key: Key) -> bool {
        false
    }
}

/// Set of currently held keys.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    pressed: HashSet<Key>,
}

impl KeyState {
    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.remove(&key);
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

impl KeyInput for KeyState {
    fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}

/// Turns arrow keys into forces on the owning entity.
#[derive(Debug, Clone)]
pub struct PlayerInputBehavior {
    /// Base force in newtons; moves use 10x, the jump impulse 300x.
    pub force_strength: f32,
}

impl Default for PlayerInputBehavior {
    fn default() -> Self {
        Self {
            force_strength: 5000.0,
        }
    }
}

impl Behavior for PlayerInputBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::PlayerInput
    }

    fn update(&mut self, ctx: &mut UpdateContext) {
        let strength = self.force_strength;
        let input = ctx.input;
        let e = &mut *ctx.entity;

        if input.is_pressed(Key::Left) {
            e.apply_force(Vec2::new(-strength * 10.0, 0.0));
        }
        if input.is_pressed(Key::Right) {
            e.apply_force(Vec2::new(strength * 10.0, 0.0));
        }
        if input.is_pressed(Key::Up) {
            if !e.jump {
                e.apply_force(Vec2::new(0.0, -strength * 300.0));
                e.jump = true;
                e.on_ground = false;
            }
            // Holding the key keeps pushing after the initial impulse.
            e.apply_force(Vec2::new(0.0, -strength * 10.0));
        }
        if input.is_pressed(Key::Down) {
            e.apply_force(Vec2::new(0.0, strength * 10.0));
        }
    }
}
