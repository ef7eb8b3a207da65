//! Tuning constants for the simulation core.

/// Target number of simulation ticks per second for the headless host.
pub const TICKS_PER_SECOND: u64 = 60;

/// Lower bound applied to every entity mass, keeps `F / m` finite.
pub const MIN_MASS: f32 = 0.1;

/// Maximum linear speed of a dynamic entity (units per second).
pub const MAX_SPEED: f32 = 200.0;

/// Below this speed no drag direction is computed.
pub const MIN_DRAG_SPEED: f32 = 0.001;

/// Vertical distance under which a body counts as resting on a static top edge.
pub const GROUND_TOLERANCE: f32 = 2.0;

/// Smallest upward velocity still accepted as "resting" (elastic rebound).
pub const GROUNDED_MIN_VERTICAL_VELOCITY: f32 = -0.1;

/// Fluid-interaction constants.
pub mod fluid {
    /// Depth used to turn a 2D submerged area into a volume.
    pub const ESTIMATED_THICKNESS: f32 = 10.0;
    /// Converts `density * volume * g` into simulation force units.
    pub const VOLUME_TO_FORCE_SCALE: f32 = 0.00001;
    /// Buoyancy is capped at this multiple of the body's weight.
    pub const MAX_BUOYANCY_WEIGHT_RATIO: f32 = 1.5;
    /// Drag coefficient applied to `(1 - viscosity) * submersion`.
    pub const DRAG_COEFFICIENT: f32 = 2.0;
    /// Velocity damping factor applied near the free surface.
    pub const SURFACE_DAMPING_FACTOR: f32 = 0.5;
    /// Surface damping is active strictly between these submersion ratios.
    pub const SURFACE_DAMPING_RANGE: (f32, f32) = (0.1, 0.9);
    /// Minimum number of vertical slices used to integrate a wavy surface.
    pub const MIN_SURFACE_SAMPLES: usize = 10;
    /// Ratio at or above which a body is considered fully submerged.
    pub const FULLY_SUBMERGED_RATIO: f32 = 0.99;
    /// Ratio at or below which a rising body has emerged.
    pub const EMERGED_RATIO: f32 = 0.01;
    /// Upward speed that marks the start of a rise.
    pub const RISING_SPEED: f32 = 5.0;
}

/// Contact bits set by solid collision resolution.
pub mod contact {
    pub const HORIZONTAL: u8 = 1;
    pub const VERTICAL: u8 = 2;
}

/// Contact bits set by the world-boundary clamp.
pub mod boundary {
    pub const LEFT: u8 = 1;
    pub const TOP: u8 = 2;
    pub const RIGHT: u8 = 4;
    pub const BOTTOM: u8 = 8;
}
