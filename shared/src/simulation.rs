//! Entity store and the per-tick update pipeline.
//!
//! The [`Simulation`] owns every entity in an arena kept in registration
//! order. Ids are handed out monotonically and never reused, so the arena
//! stays sorted by id and lookups are a binary search.
//!
//! One call to [`Simulation::step`]:
//!
//! 1. snapshots the ids of active entities,
//! 2. for each of them resets contacts, runs behaviors, integrates dynamic
//!    bodies and clamps them into the world,
//! 3. moves the camera,
//! 4. clears the force accumulators of every entity, inactive ones included.

use bevy::color::Color;
use bevy::math::{Rect, Vec2};
use bevy_ecs::resource::Resource;

use crate::behavior::input::KeyInput;
use crate::behavior::{DrawShape, UpdateContext};
use crate::camera::Camera;
use crate::entity::{Entity, EntityId, PhysicsKind};
use crate::error::{PhysicsError, PhysicsResult};
use crate::material::Material;
use crate::physics::fluid::{SubmersionState, SubmersionTracker};
use crate::physics::{self, Neighbors, TickContext};
use crate::world::World;

#[derive(Resource)]
pub struct Simulation {
    world: World,
    camera: Option<Camera>,
    entities: Vec<Entity>,
    submersion: SubmersionTracker,
    next_id: u64,
    time_ms: u64,
    /// 0 hides debug lines in [`DrawFrame`]s.
    pub debug_level: u8,
}

/// Renderer-facing snapshot of one entity.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub id: EntityId,
    pub name: String,
    pub bounds: Rect,
    pub rotation: f32,
    pub color: Option<Color>,
    pub fill_color: Option<Color>,
    pub shapes: Vec<DrawShape>,
    pub debug: Vec<String>,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct DrawFrame {
    /// Subtract from world coordinates to get screen coordinates.
    pub camera_offset: Vec2,
    pub world: Rect,
    pub time_ms: u64,
    pub items: Vec<DrawItem>,
}

impl Simulation {
    pub fn new(world: World) -> Self {
        Self {
            world,
            camera: None,
            entities: Vec::new(),
            submersion: SubmersionTracker::default(),
            next_id: 0,
            time_ms: 0,
            debug_level: 0,
        }
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn set_world(&mut self, world: World) {
        self.world = world;
    }

    #[inline]
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn set_camera(&mut self, camera: Option<Camera>) {
        self.camera = camera;
    }

    /// Simulated time in milliseconds.
    #[inline]
    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    /// Entities in registration order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn active_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.active)
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let index = self.index_of(id)?;
        Some(&self.entities[index])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.index_of(id)?;
        Some(&mut self.entities[index])
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Registers an entity and runs the `init` hook of each of its behaviors.
    ///
    /// If any behavior refuses the entity, the behaviors already initialized
    /// are disposed and the entity is dropped.
    pub fn spawn(&mut self, mut entity: Entity) -> PhysicsResult<EntityId> {
        let id = EntityId(self.next_id);
        entity.id = id;
        entity.parent = None;
        entity.children.clear();
        if entity.name.is_empty() {
            entity.name = format!("entity_{}", id.0);
        }

        let mut behaviors = entity.take_behaviors();
        for i in 0..behaviors.len() {
            if let Err(err) = behaviors[i].init(&entity) {
                for initialized in behaviors[..i].iter_mut() {
                    initialized.dispose(&entity);
                }
                log::warn!("rejected entity '{}': {}", entity.name, err);
                return Err(err);
            }
        }
        entity.restore_behaviors(behaviors);

        log::debug!("spawned {} '{}'", id, entity.name);
        self.next_id += 1;
        self.entities.push(entity);
        Ok(id)
    }

    /// Links `child` under `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> PhysicsResult<()> {
        if self.index_of(parent).is_none() {
            return Err(PhysicsError::UnknownEntity(parent));
        }
        let child_index = self.index_of(child).ok_or(PhysicsError::UnknownEntity(child))?;

        // Walk up from the new parent: meeting the child means a loop.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(PhysicsError::HierarchyCycle { parent, child });
            }
            cursor = self.get(id).and_then(|e| e.parent);
        }

        if let Some(old_parent) = self.entities[child_index].parent {
            if let Some(old) = self.get_mut(old_parent) {
                old.children.retain(|c| *c != child);
            }
        }
        self.entities[child_index].parent = Some(parent);
        if let Some(p) = self.get_mut(parent) {
            if !p.children.contains(&child) {
                p.children.push(child);
            }
        }
        Ok(())
    }

    /// Removes an entity and all of its descendants, disposing their behaviors.
    pub fn despawn(&mut self, id: EntityId) -> PhysicsResult<()> {
        let root = self.get(id).ok_or(PhysicsError::UnknownEntity(id))?;
        if let Some(parent) = root.parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(index) = self.index_of(next) else {
                continue;
            };
            let mut entity = self.entities.remove(index);
            pending.extend(entity.children.iter().copied());
            Self::dispose_entity(&mut entity);
            self.submersion.remove(next);
            log::debug!("despawned {} '{}'", next, entity.name);
        }
        Ok(())
    }

    /// Removes every entity. The world and camera are kept.
    pub fn clear(&mut self) {
        for entity in self.entities.iter_mut() {
            Self::dispose_entity(entity);
        }
        self.entities.clear();
        self.submersion.clear();
    }

    fn dispose_entity(entity: &mut Entity) {
        let mut behaviors = entity.take_behaviors();
        for behavior in behaviors.iter_mut() {
            behavior.dispose(entity);
        }
        entity.restore_behaviors(behaviors);
    }

    /// Advances the simulation by `elapsed_ms`. Negative durations count as 0.
    pub fn step(&mut self, elapsed_ms: i64, input: &dyn KeyInput) {
        let elapsed = elapsed_ms.max(0) as u64;
        self.time_ms += elapsed;
        let time = self.time_ms as f32 / 1000.0;

        let ids: Vec<EntityId> = self.entities.iter().filter(|e| e.active).map(|e| e.id).collect();

        for id in ids {
            let Some(index) = self.index_of(id) else {
                continue;
            };
            let (before, rest) = self.entities.split_at_mut(index);
            let Some((entity, after)) = rest.split_first_mut() else {
                continue;
            };
            if !entity.active {
                continue;
            }
            if !entity.is_finite() {
                log::error!("skipping {} '{}' with non-finite state", entity.id, entity.name);
                continue;
            }

            entity.reset_contacts();
            let dynamic = entity.kind == PhysicsKind::Dynamic;
            if dynamic {
                entity.on_ground = false;
            }

            let mut behaviors = entity.take_behaviors();
            for behavior in behaviors.iter_mut() {
                let mut ctx = UpdateContext::new(elapsed, time, entity, input, before, after);
                behavior.update(&mut ctx);
            }
            entity.restore_behaviors(behaviors);

            if dynamic {
                let tick = TickContext {
                    world: &self.world,
                    elapsed_ms: elapsed,
                    now_ms: self.time_ms,
                };
                physics::integrate(entity, Neighbors::new(before, after), &tick, &mut self.submersion);
            }

            self.world.keep_inside(entity);
        }

        if let Some(camera) = self.camera.as_mut() {
            let target = camera
                .target
                .and_then(|id| self.entities.binary_search_by_key(&id, |e| e.id).ok())
                .map(|i| self.entities[i].bounds());
            if let Some(bounds) = target {
                camera.update(bounds, elapsed);
            }
        }

        for entity in self.entities.iter_mut() {
            entity.reset_forces();
        }
    }

    /// Flips the world's vertical gravity.
    pub fn reverse_gravity(&mut self) {
        self.world.reverse_gravity();
        log::info!("gravity is now {:?}", self.world.gravity);
    }

    /// Friction used for a body touching `materials`; the world's ambient
    /// friction when the list is empty.
    pub fn combined_friction(&self, materials: &[&Material]) -> f32 {
        physics::combined_friction(materials, self.world.material())
    }

    pub fn submersion(&self, id: EntityId) -> Option<&SubmersionState> {
        self.submersion.get(id)
    }

    /// Snapshot of every active entity for rendering.
    pub fn draw_frame(&self) -> DrawFrame {
        let items = self
            .active_entities()
            .map(|entity| {
                let mut shapes = Vec::new();
                for behavior in entity.behaviors() {
                    behavior.draw(entity, &mut shapes);
                }
                DrawItem {
                    id: entity.id,
                    name: entity.name.clone(),
                    bounds: entity.bounds(),
                    rotation: entity.rotation,
                    color: entity.color,
                    fill_color: entity.fill_color,
                    shapes,
                    debug: if self.debug_level > 0 {
                        entity.debug_info()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();

        DrawFrame {
            camera_offset: self.camera.as_ref().map(|c| c.position).unwrap_or(Vec2::ZERO),
            world: self.world.bounds(),
            time_ms: self.time_ms,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::input::{Key, KeyState, NoInput, PlayerInputBehavior};
    use crate::behavior::wave::WaveBehavior;
    use crate::behavior::{Behavior, BehaviorKind, UpdateFn};
    use crate::constants::{boundary, contact};
    use crate::material::{AIR, DEFAULT, FLOATING_WOOD, ICE, METAL, STONE, WATER};
    use crate::physics::fluid::submersion_ratio;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const EARTH_GRAVITY: Vec2 = Vec2::new(0.0, 294.3);

    fn sim(width: f32, height: f32) -> Simulation {
        Simulation::new(
            World::new("earth", width, height)
                .with_gravity(EARTH_GRAVITY)
                .with_material(Arc::clone(&AIR)),
        )
    }

    fn water(x: f32, y: f32, w: f32, h: f32) -> Entity {
        Entity::new("water")
            .with_position(x, y)
            .with_size(w, h)
            .with_kind(PhysicsKind::Static)
            .with_material(Arc::clone(&WATER))
    }

    struct DisposeProbe(Arc<AtomicBool>);

    impl Behavior for DisposeProbe {
        fn kind(&self) -> BehaviorKind {
            BehaviorKind::Custom("probe")
        }

        fn dispose(&mut self, _entity: &Entity) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_resting_on_platform() {
        let mut sim = sim(640.0, 480.0);
        sim.spawn(
            Entity::new("platform")
                .with_position(200.0, 400.0)
                .with_size(128.0, 32.0)
                .with_kind(PhysicsKind::Static)
                .with_material(Arc::clone(&STONE)),
        )
        .unwrap();
        let mut player = Entity::new("player")
            .with_position(200.0, 200.0)
            .with_size(24.0, 32.0)
            .with_mass(70.0)
            .with_material(Arc::clone(&DEFAULT));
        player.jump = true;
        let id = sim.spawn(player).unwrap();

        for _ in 0..600 {
            sim.step(16, &NoInput);
        }

        let player = sim.get(id).unwrap();
        assert!((player.position.y - 368.0).abs() < 0.5, "y={}", player.position.y);
        assert!(player.on_ground);
        assert!(!player.jump);
    }

    #[test]
    fn test_light_box_floats() {
        let mut sim = sim(640.0, 480.0);
        let pool = sim.spawn(water(0.0, 300.0, 640.0, 180.0)).unwrap();
        let crate_id = sim
            .spawn(
                Entity::new("crate")
                    .with_position(100.0, 350.0)
                    .with_size(50.0, 50.0)
                    .with_mass(60.0)
                    .with_material(Arc::clone(&FLOATING_WOOD)),
            )
            .unwrap();

        let mut early = Vec::new();
        let mut late = Vec::new();
        for tick in 0..1200 {
            sim.step(16, &NoInput);
            let y = sim.get(crate_id).unwrap().position.y;
            if tick < 100 {
                early.push(y);
            } else if tick >= 1100 {
                late.push(y);
            }
        }

        let ratio = submersion_ratio(sim.get(crate_id).unwrap(), sim.get(pool).unwrap());
        assert!(ratio > 0.15 && ratio < 0.35, "ratio={ratio}");

        let spread = |ys: &[f32]| {
            let max = ys.iter().cloned().fold(f32::MIN, f32::max);
            let min = ys.iter().cloned().fold(f32::MAX, f32::min);
            max - min
        };
        assert!(spread(&late) < spread(&early));
        assert!(spread(&late) < 1.0);
    }

    #[test]
    fn test_heavy_box_sinks_at_terminal_speed() {
        let mut sim = sim(640.0, 800.0);
        let pool = sim.spawn(water(0.0, 300.0, 640.0, 500.0)).unwrap();
        let ingot = sim
            .spawn(
                Entity::new("ingot")
                    .with_position(300.0, 200.0)
                    .with_size(30.0, 30.0)
                    .with_mass(200.0)
                    .with_material(Arc::clone(&METAL)),
            )
            .unwrap();

        let mut speeds = Vec::new();
        for _ in 0..400 {
            sim.step(16, &NoInput);
            let body = sim.get(ingot).unwrap();
            if body.intersects(sim.get(pool).unwrap()) {
                assert!(body.velocity.y > 0.0, "rising at y={}", body.position.y);
            }
            speeds.push(body.velocity.y);
        }

        let body = sim.get(ingot).unwrap();
        assert!(body.bottom() < 800.0);
        assert_eq!(submersion_ratio(body, sim.get(pool).unwrap()), 1.0);
        assert!(speeds[250] > 40.0 && speeds[250] < 60.0, "v={}", speeds[250]);
        assert!((speeds[250] - speeds[260]).abs() < 1.0);
        assert!(sim.submersion(ingot).unwrap().was_fully_submerged);
    }

    #[test]
    fn test_slipperiest_material_wins() {
        let sim = sim(100.0, 100.0);
        assert_eq!(sim.combined_friction(&[&**ICE, &**STONE]), 0.02);
        assert_eq!(sim.combined_friction(&[]), AIR.friction());
    }

    #[test]
    fn test_wave_on_solid_is_rejected() {
        let mut sim = sim(100.0, 100.0);
        let probe = Arc::new(AtomicBool::new(false));
        let result = sim.spawn(
            Entity::new("rock")
                .with_size(10.0, 10.0)
                .with_material(Arc::clone(&STONE))
                .with_behavior(DisposeProbe(Arc::clone(&probe)))
                .with_behavior(WaveBehavior::with_cell_size(3.0)),
        );
        assert!(matches!(result, Err(PhysicsError::NonFluidWaveAttachment { .. })));
        assert!(sim.entities().is_empty());
        assert!(probe.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ids_are_monotonic_and_default_names() {
        let mut sim = sim(100.0, 100.0);
        let a = sim.spawn(Entity::new("")).unwrap();
        let b = sim.spawn(Entity::new("b")).unwrap();
        sim.despawn(a).unwrap();
        let c = sim.spawn(Entity::new("c")).unwrap();
        assert!(a < b && b < c);
        assert!(sim.get(a).is_none());
        assert_eq!(sim.find_by_name("c").map(|e| e.id()), Some(c));

        let mut other = Simulation::new(World::new("w", 10.0, 10.0));
        let first = other.spawn(Entity::new("")).unwrap();
        assert_eq!(other.get(first).unwrap().name, "entity_0");
    }

    #[test]
    fn test_forces_cleared_after_step() {
        let mut sim = sim(640.0, 480.0);
        let id = sim
            .spawn(
                Entity::new("pushed")
                    .with_position(100.0, 100.0)
                    .with_size(10.0, 10.0)
                    .with_behavior(UpdateFn::new("push", |ctx: &mut UpdateContext| {
                        ctx.entity.apply_force(Vec2::new(10.0, 0.0));
                    })),
            )
            .unwrap();
        sim.get_mut(id).unwrap().apply_force(Vec2::new(5.0, 5.0));
        sim.step(16, &NoInput);
        assert!(sim.get(id).unwrap().forces().is_empty());
        assert!(sim.get(id).unwrap().velocity.x > 0.0);
    }

    #[test]
    fn test_negative_elapsed_is_harmless() {
        let mut sim = sim(640.0, 480.0);
        let id = sim
            .spawn(Entity::new("e").with_position(50.0, 50.0).with_size(10.0, 10.0))
            .unwrap();
        sim.step(-250, &NoInput);
        let e = sim.get(id).unwrap();
        assert!(e.is_finite());
        assert_eq!(e.position, Vec2::new(50.0, 50.0));
        assert_eq!(sim.time_ms(), 0);
    }

    #[test]
    fn test_reverse_gravity_lifts_bodies() {
        let mut sim = sim(640.0, 480.0);
        let id = sim
            .spawn(Entity::new("e").with_position(300.0, 240.0).with_size(10.0, 10.0))
            .unwrap();
        sim.reverse_gravity();
        for _ in 0..10 {
            sim.step(16, &NoInput);
        }
        let e = sim.get(id).unwrap();
        assert!(e.velocity.y < 0.0);
        assert!(e.position.y < 240.0);
    }

    #[test]
    fn test_player_jumps_once_per_landing() {
        let mut sim = sim(640.0, 480.0);
        sim.spawn(
            Entity::new("platform")
                .with_position(200.0, 400.0)
                .with_size(128.0, 32.0)
                .with_kind(PhysicsKind::Static)
                .with_material(Arc::clone(&STONE)),
        )
        .unwrap();
        let id = sim
            .spawn(
                Entity::new("player")
                    .with_position(250.0, 368.0)
                    .with_size(24.0, 32.0)
                    .with_mass(70.0)
                    .with_behavior(PlayerInputBehavior::default()),
            )
            .unwrap();
        let mut keys = KeyState::default();
        keys.press(Key::Up);

        sim.step(16, &keys);
        let player = sim.get(id).unwrap();
        assert!(player.jump);
        assert!(player.velocity.y < -100.0);

        // Holding the key in the air only adds the small sustained push.
        let before = sim.get(id).unwrap().velocity.y;
        sim.step(16, &keys);
        let player = sim.get(id).unwrap();
        assert!(player.jump);
        assert!(player.velocity.y - before > -20.0);

        for _ in 0..200 {
            sim.step(16, &NoInput);
        }
        let player = sim.get(id).unwrap();
        assert!((player.position.y - 368.0).abs() < 0.5, "y={}", player.position.y);
        assert!(player.on_ground);
        assert!(!player.jump);

        sim.step(16, &keys);
        let player = sim.get(id).unwrap();
        assert!(player.jump);
        assert!(player.velocity.y < -100.0);
    }

    #[test]
    fn test_inactive_entity_keeps_no_forces() {
        let mut sim = sim(640.0, 480.0);
        let id = sim
            .spawn(
                Entity::new("idle")
                    .with_position(100.0, 100.0)
                    .with_size(10.0, 10.0)
                    .with_active(false),
            )
            .unwrap();
        sim.get_mut(id).unwrap().apply_force(Vec2::new(100.0, 0.0));
        for _ in 0..5 {
            sim.step(16, &NoInput);
        }
        assert!(sim.get(id).unwrap().forces().is_empty());

        sim.get_mut(id).unwrap().active = true;
        sim.step(16, &NoInput);
        assert_eq!(sim.get(id).unwrap().velocity.x, 0.0);
    }

    #[test]
    fn test_contact_masks_reset_each_tick() {
        let mut sim = Simulation::new(World::new("flat", 640.0, 480.0).with_gravity(Vec2::ZERO));
        sim.spawn(
            Entity::new("wall")
                .with_position(5.0, 100.0)
                .with_size(20.0, 40.0)
                .with_kind(PhysicsKind::Static)
                .with_material(Arc::clone(&STONE)),
        )
        .unwrap();
        let id = sim
            .spawn(
                Entity::new("body")
                    .with_position(0.5, 110.0)
                    .with_size(10.0, 10.0)
                    .with_velocity(-100.0, 0.0),
            )
            .unwrap();

        sim.step(16, &NoInput);
        let body = sim.get(id).unwrap();
        assert_eq!(body.contact(), contact::HORIZONTAL);
        assert_eq!(body.boundary_contact(), boundary::LEFT);

        let body = sim.get_mut(id).unwrap();
        body.position = Vec2::new(300.0, 300.0);
        body.velocity = Vec2::ZERO;
        sim.step(16, &NoInput);
        let body = sim.get(id).unwrap();
        assert_eq!(body.contact(), 0);
        assert_eq!(body.boundary_contact(), 0);
    }

    #[test]
    fn test_despawn_disposes_subtree() {
        let mut sim = sim(640.0, 480.0);
        let parent_probe = Arc::new(AtomicBool::new(false));
        let child_probe = Arc::new(AtomicBool::new(false));
        let parent = sim
            .spawn(Entity::new("parent").with_behavior(DisposeProbe(Arc::clone(&parent_probe))))
            .unwrap();
        let child = sim
            .spawn(Entity::new("child").with_behavior(DisposeProbe(Arc::clone(&child_probe))))
            .unwrap();
        let bystander = sim.spawn(Entity::new("bystander")).unwrap();
        sim.add_child(parent, child).unwrap();
        assert_eq!(sim.get(parent).unwrap().children(), &[child]);
        assert_eq!(sim.get(child).unwrap().parent(), Some(parent));

        sim.despawn(parent).unwrap();
        assert!(parent_probe.load(Ordering::SeqCst));
        assert!(child_probe.load(Ordering::SeqCst));
        assert!(sim.get(child).is_none());
        assert!(sim.get(bystander).is_some());
        assert_eq!(sim.despawn(parent), Err(PhysicsError::UnknownEntity(parent)));
    }

    #[test]
    fn test_hierarchy_cycles_are_rejected() {
        let mut sim = sim(100.0, 100.0);
        let a = sim.spawn(Entity::new("a")).unwrap();
        let b = sim.spawn(Entity::new("b")).unwrap();
        let c = sim.spawn(Entity::new("c")).unwrap();
        sim.add_child(a, b).unwrap();
        sim.add_child(b, c).unwrap();
        assert_eq!(
            sim.add_child(c, a),
            Err(PhysicsError::HierarchyCycle { parent: c, child: a })
        );
        assert!(sim.add_child(a, a).is_err());
        assert_eq!(
            sim.add_child(a, EntityId(99)),
            Err(PhysicsError::UnknownEntity(EntityId(99)))
        );

        // re-parenting moves the child
        sim.add_child(a, c).unwrap();
        assert!(sim.get(b).unwrap().children().is_empty());
        assert_eq!(sim.get(a).unwrap().children(), &[b, c]);
    }

    #[test]
    fn test_clear_disposes_and_empties() {
        let mut sim = sim(100.0, 100.0);
        let probe = Arc::new(AtomicBool::new(false));
        sim.spawn(Entity::new("p").with_behavior(DisposeProbe(Arc::clone(&probe))))
            .unwrap();
        sim.clear();
        assert!(sim.entities().is_empty());
        assert!(probe.load(Ordering::SeqCst));
        let next = sim.spawn(Entity::new("after")).unwrap();
        assert_eq!(next, EntityId(1));
    }

    #[test]
    fn test_wave_surface_stays_bounded_in_step() {
        let mut sim = sim(640.0, 480.0);
        let pool = sim
            .spawn(water(0.0, 400.0, 640.0, 80.0).with_behavior(WaveBehavior::with_cell_size(4.0)))
            .unwrap();
        sim.spawn(
            Entity::new("rock")
                .with_position(300.0, 300.0)
                .with_size(20.0, 20.0)
                .with_mass(30.0),
        )
        .unwrap();
        for _ in 0..300 {
            sim.step(16, &NoInput);
        }
        let wave = sim.get(pool).unwrap().wave().unwrap();
        let (cols, rows) = wave.grid_size().unwrap();
        let limit = wave.config().amplitude * 2.0;
        for x in 0..cols {
            for y in 0..rows {
                let h = wave.height_at_cell(x, y).unwrap();
                assert!(h.abs() <= limit + 1e-5);
                if x == 0 || y == 0 || x + 1 == cols || y + 1 == rows {
                    assert_eq!(h, 0.0);
                }
            }
        }

        let frame = sim.draw_frame();
        let pool_item = frame.items.iter().find(|i| i.id == pool).unwrap();
        assert!(matches!(pool_item.shapes.first(), Some(DrawShape::Polygon { .. })));
    }

    #[test]
    fn test_camera_follows_target() {
        let mut sim = sim(2000.0, 2000.0);
        let id = sim
            .spawn(
                Entity::new("still")
                    .with_position(1000.0, 1000.0)
                    .with_size(20.0, 20.0)
                    .with_kind(PhysicsKind::Static),
            )
            .unwrap();
        sim.set_camera(Some(Camera::new("cam", Vec2::new(200.0, 100.0)).with_target(id)));
        for _ in 0..500 {
            sim.step(16, &NoInput);
        }
        let frame = sim.draw_frame();
        assert!((frame.camera_offset - Vec2::new(910.0, 960.0)).length() < 0.01);
    }

    #[test]
    fn test_debug_lines_follow_debug_level() {
        let mut sim = sim(100.0, 100.0);
        sim.spawn(Entity::new("e").with_size(5.0, 5.0)).unwrap();
        assert!(sim.draw_frame().items[0].debug.is_empty());
        sim.debug_level = 2;
        assert!(!sim.draw_frame().items[0].debug.is_empty());
    }
}
