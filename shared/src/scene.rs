//! Scene construction: the built-in demo and data-driven scene files.

use std::sync::Arc;

use bevy::color::Color;
use bevy::math::Vec2;
use bevy_log::info;
use serde::{Deserialize, Serialize};

use crate::behavior::input::PlayerInputBehavior;
use crate::behavior::wave::{WaveBehavior, WaveConfig};
use crate::behavior::BehaviorKind;
use crate::camera::Camera;
use crate::entity::{Entity, EntityId, PhysicsKind};
use crate::error::{PhysicsError, PhysicsResult};
use crate::material::{self, Material};
use crate::simulation::Simulation;
use crate::world::World;

const LIGHT_GRAY: Color = Color::srgb(0.75, 0.75, 0.75);
const GRAY: Color = Color::srgb(0.5, 0.5, 0.5);
const DARK_GRAY: Color = Color::srgb(0.25, 0.25, 0.25);

/// Replaces the content of `sim` with the demo level and returns the player.
///
/// A 640x400 world with two stone platforms, a controllable player, a wooden
/// crate that floats, a metal box that sinks and a strip of wavy water along
/// the bottom. The camera follows the player.
pub fn build_demo(sim: &mut Simulation, viewport: Vec2) -> PhysicsResult<EntityId> {
    build_demo_with_seed(sim, viewport, None)
}

/// [`build_demo`] with a fixed seed for the water surface.
pub fn build_demo_with_seed(sim: &mut Simulation, viewport: Vec2, seed: Option<u64>) -> PhysicsResult<EntityId> {
    sim.clear();
    let world = World::new("earth", 32.0 * 20.0, 20.0 * 20.0)
        .with_gravity(Vec2::new(0.0, 98.1 * 3.0))
        .with_material(Arc::clone(&material::AIR));
    let size = world.size;
    sim.set_world(world);

    sim.spawn(
        Entity::new("platform1")
            .with_size(128.0, 32.0)
            .with_position(200.0, 400.0)
            .with_fill_color(LIGHT_GRAY)
            .with_color(DARK_GRAY)
            .with_kind(PhysicsKind::Static)
            .with_material(Arc::clone(&material::STONE)),
    )?;
    sim.spawn(
        Entity::new("platform2")
            .with_size(96.0, 32.0)
            .with_position(400.0, 300.0)
            .with_fill_color(LIGHT_GRAY)
            .with_color(DARK_GRAY)
            .with_kind(PhysicsKind::Static)
            .with_material(Arc::clone(&material::STONE)),
    )?;

    let player = sim.spawn(
        Entity::new("player")
            .with_size(24.0, 32.0)
            .with_position(size.x * 0.5, size.y * 0.75)
            .with_material(Material::new("men", 0.70, 0.88).shared())
            .with_mass(70.0)
            .with_behavior(PlayerInputBehavior::default()),
    )?;

    sim.spawn(
        Entity::new("woodBox")
            .with_size(50.0, 50.0)
            .with_position(100.0, 100.0)
            .with_fill_color(Color::srgb_u8(139, 69, 19))
            .with_color(Color::BLACK)
            .with_mass(60.0)
            .with_material(Arc::clone(&material::FLOATING_WOOD)),
    )?;
    sim.spawn(
        Entity::new("heavyBox")
            .with_size(30.0, 30.0)
            .with_position(200.0, 100.0)
            .with_fill_color(GRAY)
            .with_color(Color::BLACK)
            .with_mass(200.0)
            .with_material(Arc::clone(&material::METAL)),
    )?;

    let waves = WaveBehavior::new(WaveConfig {
        cell_size: 3.0,
        amplitude: 4.0,
        frequency: 0.56,
        damping: 0.998,
        tension: 0.05,
        seed,
        ..Default::default()
    });
    sim.spawn(
        Entity::new("water")
            .with_size(size.x, size.y * 0.15)
            .with_position(0.0, size.y * 0.85)
            .with_fill_color(Color::srgba_u8(0, 100, 200, 100))
            .with_color(Color::srgba_u8(0, 130, 240, 100))
            .with_kind(PhysicsKind::Static)
            .with_material(Material::with_properties("water", 0.89, 0.0, true, 1000.0, 0.8).shared())
            .with_behavior(waves),
    )?;

    sim.set_camera(Some(Camera::new("cam01", viewport).with_target(player)));
    info!("demo scene ready with {} entities", sim.entities().len());
    Ok(player)
}

/// Material given either by preset name or spelled out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialRef {
    Preset(String),
    Custom {
        name: String,
        friction: f32,
        elasticity: f32,
        #[serde(default)]
        is_fluid: bool,
        #[serde(default = "unit")]
        density: f32,
        #[serde(default = "unit")]
        viscosity: f32,
    },
}

fn unit() -> f32 {
    1.0
}

impl Default for MaterialRef {
    fn default() -> Self {
        MaterialRef::Preset("default".to_string())
    }
}

impl From<&Material> for MaterialRef {
    fn from(material: &Material) -> Self {
        MaterialRef::Custom {
            name: material.name.clone(),
            friction: material.friction(),
            elasticity: material.elasticity(),
            is_fluid: material.is_fluid(),
            density: material.density(),
            viscosity: material.viscosity(),
        }
    }
}

impl MaterialRef {
    pub fn resolve(&self) -> PhysicsResult<Arc<Material>> {
        match self {
            MaterialRef::Preset(name) => Material::preset(name),
            MaterialRef::Custom {
                name,
                friction,
                elasticity,
                is_fluid,
                density,
                viscosity,
            } => Ok(Material::with_properties(
                name.clone(),
                *friction,
                *elasticity,
                *is_fluid,
                *density,
                *viscosity,
            )
            .shared()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDescription {
    pub name: String,
    pub size: (f32, f32),
    #[serde(default)]
    pub gravity: (f32, f32),
    #[serde(default)]
    pub material: MaterialRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    pub name: String,
    pub position: (f32, f32),
    pub size: (f32, f32),
    #[serde(default)]
    pub velocity: (f32, f32),
    #[serde(default = "unit")]
    pub mass: f32,
    #[serde(default)]
    pub material: MaterialRef,
    #[serde(default)]
    pub kind: PhysicsKind,
    /// Attach the arrow-key thrust behavior.
    #[serde(default)]
    pub player: bool,
    /// Attach a wave surface with this configuration.
    #[serde(default)]
    pub wave: Option<WaveConfig>,
    /// Name of another entity of the scene.
    #[serde(default)]
    pub parent: Option<String>,
}

impl EntityDescription {
    /// Describes a live entity. Custom behaviors are not captured.
    pub fn capture(entity: &Entity, sim: &Simulation) -> Self {
        Self {
            name: entity.name.clone(),
            position: (entity.position.x, entity.position.y),
            size: (entity.size.x, entity.size.y),
            velocity: (entity.velocity.x, entity.velocity.y),
            mass: entity.mass(),
            material: MaterialRef::from(&**entity.material()),
            kind: entity.kind,
            player: entity.find_behavior(BehaviorKind::PlayerInput).is_some(),
            wave: entity.wave().map(|w| w.config().clone()),
            parent: entity.parent().and_then(|p| sim.get(p)).map(|p| p.name.clone()),
        }
    }

    fn to_entity(&self) -> PhysicsResult<Entity> {
        let mut entity = Entity::new(self.name.clone())
            .with_position(self.position.0, self.position.1)
            .with_size(self.size.0, self.size.1)
            .with_velocity(self.velocity.0, self.velocity.1)
            .with_mass(self.mass)
            .with_material(self.material.resolve()?)
            .with_kind(self.kind);
        if self.player {
            entity = entity.with_behavior(PlayerInputBehavior::default());
        }
        if let Some(config) = &self.wave {
            entity = entity.with_behavior(WaveBehavior::new(config.clone()));
        }
        Ok(entity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDescription {
    /// Name of the followed entity.
    pub target: String,
    pub viewport: (f32, f32),
    #[serde(default = "default_tween")]
    pub tween: f32,
}

fn default_tween() -> f32 {
    0.005
}

/// Serializable description of a whole scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub world: WorldDescription,
    #[serde(default)]
    pub entities: Vec<EntityDescription>,
    #[serde(default)]
    pub camera: Option<CameraDescription>,
}

impl SceneDescription {
    pub fn from_ron(text: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(ron::de::from_str(text)?)
    }

    /// Describes the current state of `sim`, velocities included.
    pub fn capture(sim: &Simulation) -> Self {
        let world = sim.world();
        let camera = sim.camera().and_then(|camera| {
            let target = camera.target.and_then(|id| sim.get(id))?;
            Some(CameraDescription {
                target: target.name.clone(),
                viewport: (camera.viewport.x, camera.viewport.y),
                tween: camera.tween,
            })
        });
        Self {
            world: WorldDescription {
                name: world.name.clone(),
                size: (world.size.x, world.size.y),
                gravity: (world.gravity.x, world.gravity.y),
                material: MaterialRef::from(&**world.material()),
            },
            entities: sim
                .entities()
                .iter()
                .map(|e| EntityDescription::capture(e, sim))
                .collect(),
            camera,
        }
    }

    /// Fixes the seed of every wave surface that has none.
    pub fn with_seed(mut self, seed: u64) -> Self {
        for wave in self.entities.iter_mut().filter_map(|e| e.wave.as_mut()) {
            wave.seed.get_or_insert(seed);
        }
        self
    }

    /// Replaces the content of `sim` with this scene.
    pub fn build(&self, sim: &mut Simulation) -> PhysicsResult<()> {
        sim.clear();
        let w = &self.world;
        sim.set_world(
            World::new(w.name.clone(), w.size.0, w.size.1)
                .with_gravity(Vec2::new(w.gravity.0, w.gravity.1))
                .with_material(w.material.resolve()?),
        );

        let mut links = Vec::new();
        for description in &self.entities {
            let id = sim.spawn(description.to_entity()?)?;
            if let Some(parent_name) = &description.parent {
                links.push((parent_name, id));
            }
        }
        for (parent_name, child) in links {
            let parent = sim
                .find_by_name(parent_name)
                .map(|e| e.id())
                .ok_or_else(|| PhysicsError::UnknownEntityName(parent_name.clone()))?;
            sim.add_child(parent, child)?;
        }

        let camera = match &self.camera {
            Some(c) => {
                let target = sim
                    .find_by_name(&c.target)
                    .map(|e| e.id())
                    .ok_or_else(|| PhysicsError::UnknownEntityName(c.target.clone()))?;
                Some(
                    Camera::new("camera", Vec2::new(c.viewport.0, c.viewport.1))
                        .with_target(target)
                        .with_tween(c.tween),
                )
            }
            None => None,
        };
        sim.set_camera(camera);
        Ok(())
    }
}
