use bevy::math::{Rect, Vec2};

use crate::entity::EntityId;

/// Follow camera easing toward the center of its target.
#[derive(Debug, Clone)]
pub struct Camera {
    pub name: String,
    /// Top-left corner of the view in world coordinates.
    pub position: Vec2,
    pub viewport: Vec2,
    /// Fraction of the remaining distance covered per elapsed millisecond.
    pub tween: f32,
    pub target: Option<EntityId>,
}

impl Camera {
    pub fn new(name: impl Into<String>, viewport: Vec2) -> Self {
        Self {
            name: name.into(),
            position: Vec2::ZERO,
            viewport,
            tween: 0.005,
            target: None,
        }
    }

    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_tween(mut self, tween: f32) -> Self {
        self.tween = tween;
        self
    }

    /// Moves toward the position that centers `target` in the viewport.
    pub fn update(&mut self, target: Rect, elapsed_ms: u64) {
        let goal = target.center() - self.viewport / 2.0;
        let step = (self.tween * elapsed_ms as f32).clamp(0.0, 1.0);
        self.position += (goal - self.position) * step;
    }

    /// Viewport rectangle in world coordinates.
    pub fn view(&self) -> Rect {
        Rect::from_corners(self.position, self.position + self.viewport)
    }
}
