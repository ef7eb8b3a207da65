//! Error types surfaced by the simulation core.

use thiserror::Error;

use crate::entity::EntityId;

/// Programming errors detected while building or mutating a scene.
///
/// None of these are retried: they mean the caller asked for something the
/// physics model does not allow.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("wave behavior can only be attached to a fluid entity, '{entity}' uses material '{material}'")]
    NonFluidWaveAttachment { entity: String, material: String },

    #[error("wave grid for '{entity}' ({width}x{height}, cell size {cell_size}) exceeds the cell limit")]
    WaveGridTooLarge {
        entity: String,
        width: f32,
        height: f32,
        cell_size: f32,
    },

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("no entity named '{0}'")]
    UnknownEntityName(String),

    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    #[error("attaching {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: EntityId, child: EntityId },
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
