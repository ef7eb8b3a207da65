//! The play area: boundary rectangle, gravity and ambient material.

use std::sync::Arc;

use bevy::math::{Rect, Vec2};

use crate::constants::boundary;
use crate::entity::Entity;
use crate::material::{self, Material};

/// Default gravity in units/s², pointing down.
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 0.981);

#[derive(Debug, Clone)]
pub struct World {
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
    pub gravity: Vec2,
    /// Ambient medium; its friction applies to bodies touching nothing else.
    material: Arc<Material>,
}

impl World {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            position: Vec2::ZERO,
            size: Vec2::new(width, height),
            gravity: DEFAULT_GRAVITY,
            material: Arc::clone(&material::DEFAULT),
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = material;
        self
    }

    #[inline]
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = material;
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.position, self.position + self.size)
    }

    /// Flips the vertical gravity component.
    pub fn reverse_gravity(&mut self) {
        self.gravity.y = -self.gravity.y;
    }

    /// True when the entity lies entirely inside the world rectangle.
    pub fn contains(&self, entity: &Entity) -> bool {
        entity.left() >= self.position.x
            && entity.top() >= self.position.y
            && entity.right() <= self.position.x + self.size.x
            && entity.bottom() <= self.position.y + self.size.y
    }

    /// Pushes an escaping entity back inside, bouncing it off the violated
    /// edges. Returns the boundary bits that were hit.
    pub fn keep_inside(&self, entity: &mut Entity) -> u8 {
        if self.contains(entity) {
            return 0;
        }
        let restitution = entity.material().combined_elasticity(&self.material);
        let max = self.position + self.size;
        let mut hit = 0;

        if entity.position.x < self.position.x {
            entity.position.x = self.position.x;
            entity.velocity.x = -entity.velocity.x * restitution;
            hit |= boundary::LEFT;
        }
        if entity.position.y < self.position.y {
            entity.position.y = self.position.y;
            entity.velocity.y = -entity.velocity.y * restitution;
            entity.jump = false;
            hit |= boundary::TOP;
        }
        if entity.right() > max.x {
            entity.position.x = max.x - entity.size.x;
            entity.velocity.x = -entity.velocity.x * restitution;
            hit |= boundary::RIGHT;
        }
        if entity.bottom() > max.y {
            entity.position.y = max.y - entity.size.y;
            entity.velocity.y = -entity.velocity.y * restitution;
            entity.jump = false;
            entity.on_ground = true;
            hit |= boundary::BOTTOM;
        }

        entity.add_boundary_contact(hit);
        hit
    }
}
