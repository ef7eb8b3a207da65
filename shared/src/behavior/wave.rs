//! Height-field water surface driven by a damped 2D wave equation.
//!
//! The behavior owns three grids laid over its fluid entity's footprint:
//! height, vertical velocity and the previous height. Every tick it
//!
//! 1. solves the wave equation on interior cells (4-neighbor Laplacian plus a
//!    spring back to the rest level, exponentially damped),
//! 2. pins the grid edges to zero (Dirichlet boundary),
//! 3. injects a continuous sine wave along the first interior column and,
//!    rarely, a random point disturbance,
//! 4. lets every moving dynamic body inside the fluid splash the surface,
//! 5. rebuilds the surface polyline used for drawing and buoyancy.
//!
//! Grid coordinates are `(column, row)`; row 0 is the top edge of the fluid.

use bevy::color::Color;
use bevy::math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Behavior, BehaviorKind, DrawShape, UpdateContext};
use crate::entity::{Entity, PhysicsKind};
use crate::error::{PhysicsError, PhysicsResult};

/// Radius (in cells) of the circular kernel used by [`WaveBehavior::add_disturbance`].
const DISTURBANCE_RADIUS: i64 = 2;
/// Largest grid a wave surface may allocate.
pub const MAX_WAVE_CELLS: usize = 4_000_000;
/// Number of top rows averaged into one surface point.
const SURFACE_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Edge length of one grid cell in world units.
    pub cell_size: f32,
    /// Amplitude of the injected wave. Heights are clamped to twice this value.
    pub amplitude: f32,
    /// Angular frequency of the injected wave (radians per second).
    pub frequency: f32,
    /// Per-step velocity retention, kept within `0.9..=0.999`.
    pub damping: f32,
    /// Wave propagation stiffness, at least 0.1.
    pub tension: f32,
    /// Spring constant pulling every cell back to the rest level.
    pub restore_force: f32,
    /// Phase shift between consecutive rows of the injected wave.
    pub phase_offset: f32,
    /// Fraction of the injected wave added to the height field.
    pub height_injection: f32,
    /// Fraction of the injected wave added to the velocity field.
    pub velocity_injection: f32,
    /// Chance per tick of one random point disturbance.
    pub disturbance_chance: f32,
    pub disturbance_strength: f32,
    /// Splash intensity per unit of body speed.
    pub splash_factor: f32,
    /// Splashes weaker than this are ignored.
    pub min_splash: f32,
    /// Solver time units per simulated second.
    pub time_scale: f32,
    /// Peak-to-peak noise of the initial surface.
    pub initial_noise: f32,
    /// Fixed seed for reproducible runs, entropy otherwise.
    pub seed: Option<u64>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            cell_size: 3.0,
            amplitude: 3.0,
            frequency: 0.8,
            damping: 0.998,
            tension: 0.25,
            restore_force: 0.02,
            phase_offset: 0.2,
            height_injection: 0.05,
            velocity_injection: 0.02,
            disturbance_chance: 0.005,
            disturbance_strength: 0.5,
            splash_factor: 0.2,
            min_splash: 0.1,
            time_scale: 50.0,
            initial_noise: 0.5,
            seed: None,
        }
    }
}

impl WaveConfig {
    /// Copy with every parameter forced into its supported range.
    pub fn sanitized(&self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        let defaults = Self::default();
        Self {
            cell_size: finite_or(self.cell_size, defaults.cell_size).max(0.5),
            amplitude: finite_or(self.amplitude, defaults.amplitude).max(0.0),
            frequency: finite_or(self.frequency, defaults.frequency),
            damping: finite_or(self.damping, defaults.damping).clamp(0.9, 0.999),
            tension: finite_or(self.tension, defaults.tension).max(0.1),
            restore_force: finite_or(self.restore_force, defaults.restore_force).max(0.0),
            phase_offset: finite_or(self.phase_offset, defaults.phase_offset),
            height_injection: finite_or(self.height_injection, defaults.height_injection),
            velocity_injection: finite_or(self.velocity_injection, defaults.velocity_injection),
            disturbance_chance: finite_or(self.disturbance_chance, 0.0).clamp(0.0, 1.0),
            disturbance_strength: finite_or(self.disturbance_strength, 0.0),
            splash_factor: finite_or(self.splash_factor, defaults.splash_factor).max(0.0),
            min_splash: finite_or(self.min_splash, defaults.min_splash).max(0.0),
            time_scale: finite_or(self.time_scale, defaults.time_scale).max(0.0),
            initial_noise: finite_or(self.initial_noise, 0.0).max(0.0),
            seed: self.seed,
        }
    }
}

/// `(columns, rows)` covering `size`, or `None` past [`MAX_WAVE_CELLS`].
fn grid_dimensions(size: Vec2, cell_size: f32) -> Option<(usize, usize)> {
    let cols = (size.x as f64 / cell_size as f64).floor() + 1.0;
    let rows = (size.y as f64 / cell_size as f64).floor() + 1.0;
    if !cols.is_finite() || !rows.is_finite() || cols < 1.0 || rows < 1.0 {
        return None;
    }
    if cols * rows > MAX_WAVE_CELLS as f64 {
        return None;
    }
    Some((cols as usize, rows as usize))
}

/// The three solver buffers, stored column-major.
#[derive(Debug, Clone)]
struct WaveGrid {
    cols: usize,
    rows: usize,
    height: Vec<f32>,
    velocity: Vec<f32>,
    previous: Vec<f32>,
}

impl WaveGrid {
    fn new(cols: usize, rows: usize) -> Self {
        let len = cols * rows;
        Self {
            cols,
            rows,
            height: vec![0.0; len],
            velocity: vec![0.0; len],
            previous: vec![0.0; len],
        }
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        x * self.rows + y
    }

    #[inline]
    fn is_interior(&self, x: i64, y: i64) -> bool {
        x >= 1 && y >= 1 && x < self.cols as i64 - 1 && y < self.rows as i64 - 1
    }

    #[inline]
    fn is_boundary(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.cols - 1 || y == self.rows - 1
    }
}

pub struct WaveBehavior {
    config: WaveConfig,
    grid: Option<WaveGrid>,
    surface_points: Vec<Vec2>,
    /// Top-left of the fluid entity, refreshed every tick.
    origin: Vec2,
    /// Bottom-right of the fluid entity.
    extent: Vec2,
    /// Rest level of the free surface in world coordinates.
    base_level: f32,
    time: f32,
    rng: StdRng,
}

impl WaveBehavior {
    pub fn new(config: WaveConfig) -> Self {
        let config = config.sanitized();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            grid: None,
            surface_points: Vec::new(),
            origin: Vec2::ZERO,
            extent: Vec2::ZERO,
            base_level: 0.0,
            time: 0.0,
            rng,
        }
    }

    pub fn with_cell_size(cell_size: f32) -> Self {
        Self::new(WaveConfig {
            cell_size,
            ..Default::default()
        })
    }

    #[inline]
    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    #[inline]
    pub fn base_level(&self) -> f32 {
        self.base_level
    }

    /// Surface polyline, one point per grid column, world coordinates.
    #[inline]
    pub fn surface_points(&self) -> &[Vec2] {
        &self.surface_points
    }

    /// `(columns, rows)` while attached.
    pub fn grid_size(&self) -> Option<(usize, usize)> {
        self.grid.as_ref().map(|g| (g.cols, g.rows))
    }

    pub fn is_allocated(&self) -> bool {
        self.grid.is_some()
    }

    pub fn height_at_cell(&self, x: usize, y: usize) -> Option<f32> {
        let grid = self.grid.as_ref()?;
        (x < grid.cols && y < grid.rows).then(|| grid.height[grid.idx(x, y)])
    }

    pub fn velocity_at_cell(&self, x: usize, y: usize) -> Option<f32> {
        let grid = self.grid.as_ref()?;
        (x < grid.cols && y < grid.rows).then(|| grid.velocity[grid.idx(x, y)])
    }

    /// Height stored in the cell containing the world point, 0 outside the grid.
    pub fn get_wave_height_at(&self, x: f32, y: f32) -> f32 {
        let Some(grid) = self.grid.as_ref() else {
            return 0.0;
        };
        let (gx, gy) = self.world_to_grid(x, y);
        if gx >= 0 && gy >= 0 && (gx as usize) < grid.cols && (gy as usize) < grid.rows {
            grid.height[grid.idx(gx as usize, gy as usize)]
        } else {
            0.0
        }
    }

    /// Pushes the surface around a world point with a radius-2 linear falloff.
    ///
    /// The intensity is capped at the wave amplitude; velocity receives half of
    /// the height change. Edge cells are never touched.
    pub fn add_disturbance(&mut self, x: f32, y: f32, intensity: f32) {
        let (gx, gy) = self.world_to_grid(x, y);
        let amplitude = self.config.amplitude;
        let limit = amplitude * 2.0;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if !intensity.is_finite() {
            return;
        }
        let intensity = intensity.min(amplitude);
        let radius = DISTURBANCE_RADIUS as f32;

        for dx in -DISTURBANCE_RADIUS..=DISTURBANCE_RADIUS {
            for dy in -DISTURBANCE_RADIUS..=DISTURBANCE_RADIUS {
                let nx = gx + dx;
                let ny = gy + dy;
                if !grid.is_interior(nx, ny) {
                    continue;
                }
                let distance = ((dx * dx + dy * dy) as f32).sqrt();
                if distance > radius {
                    continue;
                }
                let disturbance = intensity * (radius - distance) / radius;
                let i = grid.idx(nx as usize, ny as usize);
                grid.height[i] = (grid.height[i] + disturbance).clamp(-limit, limit);
                grid.velocity[i] += disturbance * 0.5;
            }
        }
    }

    fn world_to_grid(&self, x: f32, y: f32) -> (i64, i64) {
        let cell = self.config.cell_size;
        (
            ((x - self.origin.x) / cell).floor() as i64,
            ((y - self.origin.y) / cell).floor() as i64,
        )
    }

    fn track_entity(&mut self, entity: &Entity) {
        self.origin = entity.position;
        self.extent = entity.position + entity.size;
        self.base_level = entity.top();
    }

    // ------------------------------------------------------------------
    // Solver steps
    // ------------------------------------------------------------------

    fn solve(&mut self, dt: f32) {
        let WaveConfig {
            cell_size,
            amplitude,
            damping,
            tension,
            restore_force,
            ..
        } = self.config;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let limit = amplitude * 2.0;
        let inv_cell2 = 1.0 / (cell_size * cell_size);

        grid.previous.copy_from_slice(&grid.height);

        for x in 1..grid.cols.saturating_sub(1) {
            for y in 1..grid.rows.saturating_sub(1) {
                let i = grid.idx(x, y);
                let h = grid.previous[i];
                let laplacian = (grid.previous[grid.idx(x - 1, y)]
                    + grid.previous[grid.idx(x + 1, y)]
                    + grid.previous[grid.idx(x, y - 1)]
                    + grid.previous[grid.idx(x, y + 1)]
                    - 4.0 * h)
                    * inv_cell2;
                let acceleration = tension * laplacian - h * restore_force;
                let v = grid.velocity[i] * damping + acceleration * dt;
                grid.velocity[i] = v;
                grid.height[i] = (h + v * dt).clamp(-limit, limit);
            }
        }

        Self::zero_edges(grid);
    }

    fn zero_edges(grid: &mut WaveGrid) {
        for x in 0..grid.cols {
            for y in 0..grid.rows {
                if grid.is_boundary(x, y) {
                    let i = grid.idx(x, y);
                    grid.height[i] = 0.0;
                    grid.velocity[i] = 0.0;
                }
            }
        }
    }

    fn inject_continuous_waves(&mut self) {
        let config = &self.config;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if grid.cols < 3 {
            return;
        }
        for y in 1..grid.rows.saturating_sub(1) {
            let phase = config.frequency * self.time + y as f32 * config.phase_offset;
            let wave = config.amplitude * phase.sin();
            let i = grid.idx(1, y);
            grid.height[i] += wave * config.height_injection;
            grid.velocity[i] += wave * config.velocity_injection;
        }
    }

    fn inject_random_disturbance(&mut self) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if grid.cols < 3 || grid.rows < 3 {
            return;
        }
        if self.rng.gen::<f32>() >= self.config.disturbance_chance {
            return;
        }
        let x = self.rng.gen_range(1..grid.cols - 1);
        let y = self.rng.gen_range(1..grid.rows - 1);
        let i = grid.idx(x, y);
        grid.height[i] += (self.rng.gen::<f32>() - 0.5) * self.config.disturbance_strength;
    }

    /// Clamps interior heights and re-pins the edges after injections.
    fn enforce_bounds(&mut self) {
        let limit = self.config.amplitude * 2.0;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        for h in grid.height.iter_mut() {
            *h = h.clamp(-limit, limit);
        }
        Self::zero_edges(grid);
    }

    fn rebuild_surface_points(&mut self) {
        self.surface_points.clear();
        let Some(grid) = self.grid.as_ref() else {
            return;
        };
        let rows = SURFACE_ROWS.min(grid.rows);
        for x in 0..grid.cols {
            let mut surface = 0.0;
            if rows > 0 {
                for y in 0..rows {
                    surface += grid.height[grid.idx(x, y)];
                }
                surface /= rows as f32;
            }
            self.surface_points.push(Vec2::new(
                self.origin.x + x as f32 * self.config.cell_size,
                self.base_level + surface,
            ));
        }
    }

    /// Splash response to every moving dynamic body inside the fluid.
    fn splash(&mut self, ctx: &UpdateContext) {
        let mut impacts = Vec::new();
        for other in ctx.others() {
            if !other.active
                || other.kind != PhysicsKind::Dynamic
                || !other.intersects(&*ctx.entity)
            {
                continue;
            }
            let intensity = (other.velocity.length() * self.config.splash_factor).min(self.config.amplitude);
            if intensity > self.config.min_splash {
                impacts.push((other.center(), intensity));
            }
        }
        for (center, intensity) in impacts {
            self.add_disturbance(center.x, center.y, intensity);
        }
    }
}

impl Behavior for WaveBehavior {
    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Wave
    }

    fn init(&mut self, entity: &Entity) -> PhysicsResult<()> {
        if !entity.is_fluid() {
            return Err(PhysicsError::NonFluidWaveAttachment {
                entity: entity.name.clone(),
                material: entity.material().name.clone(),
            });
        }
        self.track_entity(entity);

        let (cols, rows) = grid_dimensions(entity.size, self.config.cell_size).ok_or_else(|| {
            PhysicsError::WaveGridTooLarge {
                entity: entity.name.clone(),
                width: entity.size.x,
                height: entity.size.y,
                cell_size: self.config.cell_size,
            }
        })?;
        let mut grid = WaveGrid::new(cols, rows);
        let noise = self.config.initial_noise;
        if noise > 0.0 {
            for h in grid.height.iter_mut() {
                *h = (self.rng.gen::<f32>() - 0.5) * noise;
            }
        }
        Self::zero_edges(&mut grid);
        grid.previous.copy_from_slice(&grid.height);
        self.grid = Some(grid);
        self.rebuild_surface_points();

        log::debug!(
            "wave grid {}x{} attached to '{}' (cell size {})",
            cols,
            rows,
            entity.name,
            self.config.cell_size
        );
        Ok(())
    }

    fn update(&mut self, ctx: &mut UpdateContext) {
        self.track_entity(&*ctx.entity);
        let elapsed = ctx.elapsed_secs();
        if elapsed > 0.0 {
            self.time += elapsed;
            self.solve(elapsed * self.config.time_scale);
            self.inject_continuous_waves();
            self.inject_random_disturbance();
            self.splash(ctx);
            self.enforce_bounds();
        }
        self.rebuild_surface_points();
    }

    fn draw(&self, entity: &Entity, out: &mut Vec<DrawShape>) {
        if self.surface_points.is_empty() {
            return;
        }
        let mut polygon = self.surface_points.clone();
        polygon.push(Vec2::new(entity.right(), entity.bottom()));
        polygon.push(Vec2::new(entity.left(), entity.bottom()));
        out.push(DrawShape::Polygon {
            points: polygon,
            fill: Color::srgba_u8(0, 100, 255, 180),
        });

        for pair in self.surface_points.windows(2) {
            let crest = (pair[0].y - self.base_level).abs();
            let alpha = (crest * 50.0 + 100.0).min(255.0) / 255.0;
            out.push(DrawShape::Line {
                from: pair[0],
                to: pair[1],
                color: Color::srgba(1.0, 1.0, 1.0, alpha),
            });
        }
    }

    fn dispose(&mut self, entity: &Entity) {
        log::debug!("releasing wave grid of '{}'", entity.name);
        self.grid = None;
        self.surface_points = Vec::new();
    }

    fn as_wave(&self) -> Option<&WaveBehavior> {
        Some(self)
    }

    fn as_wave_mut(&mut self) -> Option<&mut WaveBehavior> {
        Some(self)
    }
}
