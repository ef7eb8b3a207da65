use bevy::math::Rect;

use crate::constants::{contact, GROUNDED_MIN_VERTICAL_VELOCITY, GROUND_TOLERANCE};
use crate::entity::Entity;

/// Strict overlap test: boxes that only share an edge do not intersect.
#[inline]
pub fn aabb_intersects(a: &Rect, b: &Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

/// Area of the overlap of two boxes, 0 when they do not intersect.
pub fn intersection_area(a: &Rect, b: &Rect) -> f32 {
    let width = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let height = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if width <= 0.0 || height <= 0.0 {
        return 0.0;
    }
    width * height
}

/// Pushes a dynamic entity out of a solid along the axis of least overlap.
///
/// The velocity component on that axis is reflected away from the solid and
/// scaled by the mean elasticity of both materials and by `1/sqrt(mass)`.
/// Equal overlaps resolve vertically. Returns false when there was nothing
/// to resolve (no overlap or fluid obstacle).
///
/// Grounding is judged on the vertical velocity the body arrived with, so a
/// resting body that bounces a little every tick still counts as grounded.
pub fn resolve_collision(entity: &mut Entity, solid: &Entity) -> bool {
    if solid.is_fluid() {
        return false;
    }
    let overlap_x = (entity.right() - solid.left()).min(solid.right() - entity.left());
    let overlap_y = (entity.bottom() - solid.top()).min(solid.bottom() - entity.top());
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return false;
    }

    let restitution = entity.material().combined_elasticity(solid.material()) / entity.mass().sqrt();
    let approach_vy = entity.velocity.y;

    if overlap_x < overlap_y {
        if entity.left() < solid.left() {
            entity.position.x = solid.left() - entity.size.x;
            entity.velocity.x = -entity.velocity.x.abs() * restitution;
        } else {
            entity.position.x = solid.right();
            entity.velocity.x = entity.velocity.x.abs() * restitution;
        }
        entity.add_contact(contact::HORIZONTAL);
    } else {
        if entity.top() < solid.top() {
            entity.position.y = solid.top() - entity.size.y;
            entity.velocity.y = -entity.velocity.y.abs() * restitution;
        } else {
            entity.position.y = solid.bottom();
            entity.velocity.y = entity.velocity.y.abs() * restitution;
        }
        entity.add_contact(contact::VERTICAL);
    }

    if is_grounded_on(entity, solid, approach_vy) {
        entity.on_ground = true;
        entity.jump = false;
    }
    true
}

/// Resting test: bottom edge within tolerance of the solid's top, horizontal
/// overlap, and `vertical_velocity` not pointing up faster than a residual bounce.
pub fn is_grounded_on(entity: &Entity, solid: &Entity, vertical_velocity: f32) -> bool {
    let touching_top = (entity.bottom() - solid.top()).abs() <= GROUND_TOLERANCE;
    let horizontal_overlap = entity.right() > solid.left() && entity.left() < solid.right();
    touching_top && horizontal_overlap && vertical_velocity >= GROUNDED_MIN_VERTICAL_VELOCITY
}
