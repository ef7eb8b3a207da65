//! Physical materials shared between entities.
//!
//! A material is immutable once built and handed around as an
//! `Arc<Material>`: many entities point at the same record, none owns it.
//!
//! Friction, elasticity and viscosity are clamped to `0.0..=1.0` at
//! construction. Values outside that range would let a bounce gain energy
//! or let friction accelerate a body.

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::{PhysicsError, PhysicsResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Velocity retention factor applied per tick while in contact (1.0 = no loss).
    friction: f32,
    /// Restitution used when bouncing off solids and world bounds.
    elasticity: f32,
    is_fluid: bool,
    /// Density in kg/m³ (or the simulation's equivalent).
    density: f32,
    /// 1.0 = no drag, lower = thicker fluid.
    viscosity: f32,
}

impl Material {
    /// Builds a solid material with the default density and viscosity.
    pub fn new(name: impl Into<String>, friction: f32, elasticity: f32) -> Self {
        Self {
            name: name.into(),
            friction: clamp_unit(friction),
            elasticity: clamp_unit(elasticity),
            is_fluid: false,
            density: 1.0,
            viscosity: 1.0,
        }
    }

    /// Builds a material with every property spelled out.
    pub fn with_properties(
        name: impl Into<String>,
        friction: f32,
        elasticity: f32,
        is_fluid: bool,
        density: f32,
        viscosity: f32,
    ) -> Self {
        Self {
            name: name.into(),
            friction: clamp_unit(friction),
            elasticity: clamp_unit(elasticity),
            is_fluid,
            density: if density.is_finite() { density.max(0.0) } else { 0.0 },
            viscosity: clamp_unit(viscosity),
        }
    }

    pub fn shared(self) -> Arc<Material> {
        Arc::new(self)
    }

    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    #[inline]
    pub fn elasticity(&self) -> f32 {
        self.elasticity
    }

    #[inline]
    pub fn is_fluid(&self) -> bool {
        self.is_fluid
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    #[inline]
    pub fn viscosity(&self) -> f32 {
        self.viscosity
    }

    /// Mean elasticity of two materials in contact.
    #[inline]
    pub fn combined_elasticity(&self, other: &Material) -> f32 {
        (self.elasticity + other.elasticity) / 2.0
    }

    /// Looks up one of the built-in presets by (case-insensitive) name.
    pub fn preset(name: &str) -> PhysicsResult<Arc<Material>> {
        let preset = match name.to_ascii_lowercase().as_str() {
            "default" => &*DEFAULT,
            "ice" => &*ICE,
            "wood" => &*WOOD,
            "stone" => &*STONE,
            "air" => &*AIR,
            "water" => &*WATER,
            "metal" => &*METAL,
            "floating_wood" => &*FLOATING_WOOD,
            _ => return Err(PhysicsError::UnknownMaterial(name.to_string())),
        };
        Ok(Arc::clone(preset))
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Material{{name='{}', friction={:.2}, elasticity={:.2}, is_fluid={}, density={:.1}, viscosity={:.2}}}",
            self.name, self.friction, self.elasticity, self.is_fluid, self.density, self.viscosity
        )
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

lazy_static! {
    pub static ref DEFAULT: Arc<Material> = Material::new("default", 0.98, 0.85).shared();
    pub static ref ICE: Arc<Material> = Material::new("ice", 0.02, 0.95).shared();
    pub static ref WOOD: Arc<Material> = Material::new("wood", 0.75, 0.45).shared();
    pub static ref STONE: Arc<Material> = Material::new("stone", 0.85, 0.15).shared();
    pub static ref AIR: Arc<Material> = Material::new("air", 0.999, 0.01).shared();
    pub static ref WATER: Arc<Material> =
        Material::with_properties("water", 0.95, 0.3, true, 1000.0, 0.1).shared();
    pub static ref METAL: Arc<Material> =
        Material::with_properties("metal", 0.9, 0.1, false, 2700.0, 0.0).shared();
    /// Lighter-than-water wood used for floating crates.
    pub static ref FLOATING_WOOD: Arc<Material> =
        Material::with_properties("wood", 0.8, 0.3, false, 600.0, 0.0).shared();
}
