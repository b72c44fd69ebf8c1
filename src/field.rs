//! One particle field: the store, the pointer and the per-frame step.
//!
//! A step runs, in order:
//!
//! 1. expire a stale press window;
//! 2. apply a resize recorded since the last step;
//! 3. advance the camera;
//! 4. find particles near the pointer on screen, nearest first, capped at
//!    `max_affected`;
//! 5. pull selected particles toward their alignment target (or add
//!    attraction to their velocity), and drift and restore everyone else;
//! 6. build the draw list: one sprite per particle, one segment per linked
//!    pair, and the pointer helpers when they are switched on.
//!
//! Event handlers ([`ParticleField::handle_pointer`],
//! [`ParticleField::resize`]) only record state for the next step.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::camera::{Camera, Ray, View};
use crate::config::{AlignMode, FieldConfig, FieldOptions, Integration, ViewMode};
use crate::influence::{self, TargetContext};
use crate::integrate::{self, Motion};
use crate::lattice::Lattice;
use crate::particle::{Bounds, ParticleStore};
use crate::pointer::{PointerEvent, PointerState, PointerTracker};
use crate::render::{self, DrawList};
use crate::spatial::{self, Candidate, Link};

/// A self-contained, pointer-reactive particle field.
///
/// ```ignore
/// let mut field = ParticleField::new(FieldConfig::constellation(), Vec2::new(800.0, 600.0));
/// field.handle_pointer(PointerEvent::moved(Vec2::new(400.0, 300.0)), Instant::now());
/// let frame = field.step(Instant::now());
/// surface.present(frame);
/// ```
pub struct ParticleField {
    config: FieldConfig,
    store: ParticleStore,
    pointer: PointerTracker,
    view: View,
    viewport: Vec2,
    bounds: Bounds,
    pending_viewport: Option<Vec2>,
    /// Store was seeded into zero-area bounds and is reseeded once the
    /// viewport has area.
    needs_seed: bool,
    lattice: Option<Lattice>,
    rng: SmallRng,

    // Per-step scratch
    candidates: Vec<Candidate>,
    selected: Vec<bool>,
    /// Line slot per particle, zero outside `Line` alignment.
    slots: Vec<f32>,
    /// Candidates with their screen x, for ordering a line.
    order: Vec<(usize, f32)>,
    links: Vec<Link>,
    positions: Vec<Vec3>,
    scales: Vec<f32>,
    endpoints: Vec<Vec3>,
    frame: DrawList,
}

impl ParticleField {
    /// Seed a field of `config.particle_count` random particles.
    pub fn new(config: FieldConfig, viewport: Vec2) -> Self {
        Self::with_seed(config, viewport, time_seed())
    }

    /// Like [`ParticleField::new`] with a fixed random seed.
    pub fn with_seed(config: FieldConfig, viewport: Vec2, seed: u64) -> Self {
        let config = config.sanitized();
        let viewport = clean_viewport(viewport);
        let bounds = field_bounds(&config, viewport);
        let mut rng = SmallRng::seed_from_u64(seed);
        let store = ParticleStore::seed(config.particle_count, &bounds, config.initial_speed, &mut rng);
        let needs_seed = bounds.is_empty();
        Self::assemble(config, viewport, bounds, store, rng, needs_seed)
    }

    /// A field of particles at rest at known positions.
    /// `config.particle_count` is ignored.
    pub fn from_positions(config: FieldConfig, viewport: Vec2, positions: &[Vec3]) -> Self {
        let config = config.sanitized();
        let viewport = clean_viewport(viewport);
        let bounds = field_bounds(&config, viewport);
        let store = ParticleStore::from_positions(positions);
        let rng = SmallRng::seed_from_u64(time_seed());
        Self::assemble(config, viewport, bounds, store, rng, false)
    }

    fn assemble(
        config: FieldConfig,
        viewport: Vec2,
        bounds: Bounds,
        store: ParticleStore,
        rng: SmallRng,
        needs_seed: bool,
    ) -> Self {
        let mut field = Self {
            view: View::from_mode(&config.view),
            config,
            store,
            pointer: PointerTracker::new(),
            viewport,
            bounds,
            pending_viewport: None,
            needs_seed,
            lattice: None,
            rng,
            candidates: Vec::new(),
            selected: Vec::new(),
            slots: Vec::new(),
            order: Vec::new(),
            links: Vec::new(),
            positions: Vec::new(),
            scales: Vec::new(),
            endpoints: Vec::new(),
            frame: DrawList::new(),
        };
        field.layout_lattice();
        field
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.store
    }

    pub fn pointer(&self) -> &PointerState {
        self.pointer.state()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Viewport in effect for the current step.
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// The draw list built by the last step or render.
    pub fn frame(&self) -> &DrawList {
        &self.frame
    }

    /// Sprite scale per particle from the last render. All 1 unless ray
    /// markers are on and the pointer is over a perspective view.
    pub fn point_scales(&self) -> &[f32] {
        &self.scales
    }

    // ========== Events ==========

    /// Record a pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        self.pointer.handle(event, now, self.config.press_duration);
    }

    /// Record a new viewport size. Takes effect at the start of the next step.
    pub fn resize(&mut self, viewport: Vec2) {
        self.pending_viewport = Some(clean_viewport(viewport));
    }

    /// Forget pointer state, so nothing is influenced until the next event.
    pub fn release_pointer(&mut self) {
        self.pointer.disable();
    }

    /// Apply a flat option bag, clamping each value.
    pub fn reconfigure(&mut self, options: &FieldOptions) {
        self.config.reconfigure(options);
    }

    pub fn set_align_mode(&mut self, mode: AlignMode) {
        self.config.set_align_mode(mode);
        self.config.sanitize();
    }

    /// Replace the camera, for fields whose view is owned elsewhere.
    pub fn set_camera(&mut self, camera: Camera) {
        self.view = View::Perspective(camera);
    }

    // ========== External baselines ==========

    /// Take baselines from an external effect's points.
    ///
    /// Particle `i` follows `points[i]`. The points must be the effect's own
    /// simulated positions, never ones written by [`Self::write_positions`],
    /// or offsets would be counted twice. If the effect's point count
    /// changed, the store is rebuilt and accumulated offsets are dropped.
    pub fn sync_baselines(&mut self, points: &[Vec3]) {
        if points.len() != self.store.len() {
            log::debug!(
                "external point count changed from {} to {}, rebuilding store",
                self.store.len(),
                points.len()
            );
            self.store = ParticleStore::from_positions(points);
            return;
        }
        for (particle, &point) in self.store.iter_mut().zip(points) {
            particle.baseline = point;
            particle.sync_position();
        }
    }

    /// Copy rendered positions (baseline plus offset) out to an external
    /// effect's draw buffer.
    pub fn write_positions(&self, points: &mut [Vec3]) {
        for (point, particle) in points.iter_mut().zip(self.store.iter()) {
            *point = particle.position;
        }
    }

    // ========== Step ==========

    /// Advance one frame and build its draw list.
    ///
    /// A zero-area viewport skips simulation and yields an empty list.
    pub fn step(&mut self, now: Instant) -> &DrawList {
        self.pointer.begin_frame(now);
        self.apply_pending_resize();

        if viewport_is_empty(self.viewport) {
            self.frame.reset(self.config.style.background);
            return &self.frame;
        }

        self.view.advance();
        match self.config.integration {
            Integration::Attract => self.step_attract(),
            _ => self.step_influence(now),
        }
        self.render()
    }

    /// Build the draw list from the current state without advancing.
    pub fn render(&mut self) -> &DrawList {
        let style = self.config.style;
        self.frame.reset(style.background);
        if viewport_is_empty(self.viewport) {
            return &self.frame;
        }

        self.positions.clear();
        self.positions.extend(self.store.iter().map(|p| p.position));
        self.scales.clear();
        self.scales.resize(self.store.len(), 1.0);
        if self.config.ray_markers {
            if let Some(ray) = self.pointer_ray() {
                for (scale, &position) in self.scales.iter_mut().zip(&self.positions) {
                    *scale = render::ray_marker_scale(ray.distance_to_point(position));
                }
            }
        }
        render::push_points(
            &mut self.frame,
            &self.positions,
            &self.scales,
            &self.view,
            self.viewport,
            &style,
        );

        let link_distance = self.config.link_distance;
        if link_distance > 0.0 {
            let blend = if self.config.align_lines || !self.config.uses_offsets() {
                1.0
            } else {
                self.config.line_blend
            };
            self.endpoints.clear();
            self.endpoints
                .extend(self.store.iter().map(|p| p.baseline.lerp(p.position, blend)));
            spatial::linked_pairs(&self.endpoints, link_distance, &mut self.links);
            render::push_links(
                &mut self.frame,
                &self.endpoints,
                &self.links,
                link_distance,
                &self.view,
                self.viewport,
                &style,
            );
        }

        let pointer = self.pointer.state();
        if self.config.debug_helpers && pointer.active {
            render::push_pointer_helpers(
                &mut self.frame,
                pointer.screen_position,
                self.config.influence_radius,
            );
        }
        &self.frame
    }

    /// Ray under an active pointer, for perspective views.
    fn pointer_ray(&self) -> Option<Ray> {
        let state = self.pointer.state();
        if !state.active {
            return None;
        }
        self.view.camera()?.ray(state.screen_position, self.viewport)
    }

    fn apply_pending_resize(&mut self) {
        let Some(viewport) = self.pending_viewport.take() else {
            return;
        };
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;

        let ViewMode::Planar = self.config.view else {
            return;
        };
        let bounds = Bounds::planar(viewport.x, viewport.y);
        if bounds.is_empty() {
            // Keep the old layout until there is area again
            return;
        }

        if self.needs_seed {
            self.store = ParticleStore::seed(
                self.store.len(),
                &bounds,
                self.config.initial_speed,
                &mut self.rng,
            );
            self.lattice = None;
            self.needs_seed = false;
        } else if !self.bounds.is_empty() {
            self.store.resize_bounds(&self.bounds, &bounds);
        }
        log::debug!("field resized to {}x{}", viewport.x, viewport.y);
        self.bounds = bounds;
        self.layout_lattice();
    }

    fn layout_lattice(&mut self) {
        if self.config.integration != Integration::LatticeSeek || self.bounds.is_empty() {
            return;
        }
        let lattice = Lattice::new(&self.bounds, self.config.lattice_gap);
        match self.lattice {
            Some(old) if old == lattice => {}
            Some(old) => lattice.relayout(&old, &mut self.store),
            None => lattice.assign(&mut self.store, &mut self.rng),
        }
        self.lattice = Some(lattice);
    }

    /// Fill `candidates` with the particles the pointer reaches this frame.
    fn select_candidates(&mut self) {
        self.candidates.clear();
        let state = self.pointer.state();
        if !state.active {
            return;
        }
        let (view, viewport) = (&self.view, self.viewport);
        let projected = self
            .store
            .iter()
            .filter_map(|p| view.project(p.baseline, viewport).map(|s| (p.index, s)));
        spatial::pointer_candidates(
            projected,
            state.screen_position,
            self.config.influence_radius,
            &mut self.candidates,
        );
        spatial::rank_cutoff(&mut self.candidates, self.config.max_affected);
    }

    /// Order this frame's candidates by screen x and give each its slot in a
    /// `Line` arrangement.
    fn assign_line_slots(&mut self) {
        self.slots.clear();
        self.slots.resize(self.store.len(), 0.0);
        if !matches!(self.config.align_mode(), AlignMode::Line { .. }) {
            return;
        }
        let (view, viewport, store) = (&self.view, self.viewport, &self.store);
        self.order.clear();
        self.order.extend(self.candidates.iter().filter_map(|c| {
            let particle = store.get(c.index)?;
            view.project(particle.baseline, viewport).map(|s| (c.index, s.x))
        }));
        self.order.sort_by(|a, b| a.1.total_cmp(&b.1));
        let count = self.order.len();
        for (rank, &(index, _)) in self.order.iter().enumerate() {
            self.slots[index] = influence::line_slot(rank, count);
        }
    }

    fn step_influence(&mut self, now: Instant) {
        self.select_candidates();
        self.assign_line_slots();
        self.selected.clear();
        self.selected.resize(self.store.len(), false);

        let config = &self.config;
        let base = if self.pointer.press_active(now) {
            config.press_strength
        } else {
            config.hover_strength
        };
        let screen = self.pointer.state().screen_position;
        let mode = config.align_mode();
        let seek = config.integration == Integration::LatticeSeek;
        let lining = !seek && matches!(mode, AlignMode::Line { .. });
        let pointer_gone = !self.pointer.state().active;
        let planar = self.view.is_planar();

        for candidate in &self.candidates {
            let falloff = influence::falloff(candidate.distance, config.influence_radius);
            if falloff <= 0.0 {
                continue;
            }
            let strength = influence::strength(base, falloff);
            let Some(particle) = self.store.get_mut(candidate.index) else {
                continue;
            };

            let target = if seek {
                particle.assigned_target.unwrap_or(particle.baseline)
            } else {
                let Some((pointer, px_to_world)) =
                    self.view.pointer_world(screen, self.viewport, particle.baseline)
                else {
                    continue;
                };
                let ctx = TargetContext {
                    mode,
                    pointer,
                    px_to_world,
                    influence_radius: config.influence_radius,
                    strength,
                    planar,
                    slot: self.slots[candidate.index],
                };
                influence::target_position(particle.baseline, &ctx)
            };

            particle.offset =
                influence::blend_offset(particle.offset, particle.baseline, target, strength);
            self.selected[candidate.index] = true;
        }

        let motion = Motion {
            jitter: config.jitter,
            max_speed: config.max_speed,
        };
        let drifting = config.integration != Integration::External;
        for particle in self.store.iter_mut() {
            if self.selected[particle.index] {
                particle.line_locked = lining;
            } else {
                // A line breaks up with a small kick once the pointer leaves
                if std::mem::take(&mut particle.line_locked) && pointer_gone && drifting {
                    integrate::release_kick(particle, &mut self.rng);
                }
                if drifting {
                    integrate::drift(particle, &self.bounds, &motion, &mut self.rng);
                }
                particle.offset = influence::restore(particle.offset, config.restore_ease);
            }
            particle.sync_position();
        }
    }

    fn step_attract(&mut self) {
        self.select_candidates();

        let config = &self.config;
        let screen = self.pointer.state().screen_position;
        for candidate in &self.candidates {
            let Some(particle) = self.store.get_mut(candidate.index) else {
                continue;
            };
            let Some((toward, _)) = self.view.pointer_world(screen, self.viewport, particle.baseline)
            else {
                continue;
            };
            integrate::attract(
                particle,
                toward,
                candidate.distance,
                config.influence_radius,
                config.attraction,
            );
        }

        let motion = Motion {
            jitter: config.jitter,
            max_speed: config.max_speed,
        };
        for particle in self.store.iter_mut() {
            integrate::damp(particle, config.damping);
            integrate::drift(particle, &self.bounds, &motion, &mut self.rng);
            particle.offset = Vec3::ZERO;
            particle.sync_position();
        }
    }
}

fn field_bounds(config: &FieldConfig, viewport: Vec2) -> Bounds {
    match config.view {
        ViewMode::Planar => Bounds::planar(viewport.x, viewport.y),
        ViewMode::Perspective { .. } => Bounds::volume(config.volume),
    }
}

fn clean_viewport(viewport: Vec2) -> Vec2 {
    if viewport.is_finite() {
        viewport.max(Vec2::ZERO)
    } else {
        Vec2::ZERO
    }
}

#[inline]
fn viewport_is_empty(viewport: Vec2) -> bool {
    viewport.x <= 0.0 || viewport.y <= 0.0
}

/// Seed that differs between runs.
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Axis;
    use std::time::Duration;

    fn still(config: FieldConfig) -> FieldConfig {
        config.with_speed(0.0, 1.2).with_jitter(0.0)
    }

    #[test]
    fn test_axis_snap_end_to_end() {
        let positions = [
            Vec3::new(100.0, 100.0, 0.0),
            Vec3::new(140.0, 220.0, 0.0),
            Vec3::new(310.0, 90.0, 0.0),
            Vec3::new(250.0, 260.0, 0.0),
        ];
        let config = still(FieldConfig::constellation())
            .with_influence_radius(1.0e7)
            .with_strengths(1.0, 1.0)
            .with_align_mode(AlignMode::Axis(Axis::X));
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        field.step(now);

        for (particle, start) in field.particles().iter().zip(positions) {
            assert_eq!(particle.position.x, 200.0);
            assert_eq!(particle.position.y, start.y);
            assert_eq!(particle.position.z, start.z);
        }
    }

    #[test]
    fn test_rank_cutoff_limits_influence() {
        let positions: Vec<Vec3> = (1..=10)
            .map(|i| Vec3::new(100.0 + i as f32 * 5.0, 100.0, 0.0))
            .collect();
        let config = still(FieldConfig::constellation())
            .with_influence_radius(500.0)
            .with_strengths(1.0, 1.0)
            .with_max_affected(3)
            .with_align_mode(AlignMode::Axis(Axis::Y));
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(100.0, 120.0)), now);
        field.step(now);

        let moved: Vec<usize> = field
            .particles()
            .iter()
            .filter(|p| p.offset != Vec3::ZERO)
            .map(|p| p.index)
            .collect();
        assert_eq!(moved, vec![0, 1, 2]);
    }

    #[test]
    fn test_offsets_restore_after_leave() {
        let config = still(FieldConfig::constellation())
            .with_influence_radius(200.0)
            .with_strengths(1.0, 1.0)
            .with_align_mode(AlignMode::Axis(Axis::X));
        let start = Vec3::new(150.0, 100.0, 0.0);
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &[start]);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(160.0, 100.0)), now);
        field.step(now);
        assert_ne!(field.particles().get(0).unwrap().offset, Vec3::ZERO);

        field.handle_pointer(PointerEvent::leave(), now);
        let mut frames = 0;
        while field.particles().get(0).unwrap().offset != Vec3::ZERO {
            field.step(now);
            frames += 1;
            assert!(frames < 200);
        }
        let p = field.particles().get(0).unwrap();
        assert_eq!(p.position, p.baseline);
        assert_eq!(p.baseline, start);
    }

    #[test]
    fn test_press_strength_outlasts_release() {
        let config = still(FieldConfig::constellation())
            .with_influence_radius(1.0e7)
            .with_strengths(0.0, 1.0)
            .with_press_duration(Duration::from_millis(350))
            .with_align_mode(AlignMode::Axis(Axis::X));
        let mut field =
            ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &[Vec3::new(50.0, 50.0, 0.0)]);

        let t0 = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(80.0, 50.0)), t0);
        field.step(t0);
        assert_eq!(field.particles().get(0).unwrap().position.x, 50.0);

        field.handle_pointer(PointerEvent::down(Vec2::new(80.0, 50.0)), t0);
        field.handle_pointer(PointerEvent::up(), t0);
        field.step(t0 + Duration::from_millis(100));
        assert_eq!(field.particles().get(0).unwrap().position.x, 80.0);
    }

    #[test]
    fn test_zero_area_skips_then_recovers() {
        let config = FieldConfig::constellation().with_particle_count(30);
        let mut field = ParticleField::with_seed(config, Vec2::ZERO, 1);
        assert!(field.step(Instant::now()).is_empty());

        field.resize(Vec2::new(640.0, 480.0));
        assert_eq!(field.viewport(), Vec2::ZERO);

        let frame = field.step(Instant::now());
        assert_eq!(frame.points.len(), 30);
        let bounds = Bounds::planar(640.0, 480.0);
        assert!(field.particles().iter().all(|p| bounds.contains(p.position)));
    }

    #[test]
    fn test_resize_rescales_particles() {
        let config = still(FieldConfig::constellation());
        let mut field = ParticleField::from_positions(
            config,
            Vec2::new(200.0, 100.0),
            &[Vec3::new(100.0, 50.0, 0.0)],
        );
        field.resize(Vec2::new(400.0, 200.0));
        field.step(Instant::now());
        assert_eq!(field.particles().get(0).unwrap().position, Vec3::new(200.0, 100.0, 0.0));

        // Shrinking to nothing leaves the layout alone
        field.resize(Vec2::new(0.0, 200.0));
        field.step(Instant::now());
        assert_eq!(field.particles().get(0).unwrap().position, Vec3::new(200.0, 100.0, 0.0));
    }

    #[test]
    fn test_line_blend_when_align_lines_off() {
        let positions = [Vec3::new(100.0, 100.0, 0.0), Vec3::new(120.0, 100.0, 0.0)];
        let config = still(FieldConfig::constellation())
            .with_link_distance(200.0)
            .with_influence_radius(1.0e7)
            .with_strengths(1.0, 1.0)
            .with_align_lines(false)
            .with_align_mode(AlignMode::Axis(Axis::Y));
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(110.0, 200.0)), now);
        let frame = field.step(now);

        assert_eq!(frame.points[0].position, Vec2::new(100.0, 200.0));
        assert_eq!(frame.lines.len(), 1);
        // 35% of the way from baseline (y=100) to live position (y=200)
        assert!((frame.lines[0].a.y - 135.0).abs() < 1e-3);
    }

    #[test]
    fn test_attract_pulls_particles_in() {
        let config = FieldConfig::cluster().with_jitter(0.0);
        let start = Vec3::new(100.0, 100.0, 0.0);
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &[start]);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(180.0, 100.0)), now);
        for _ in 0..10 {
            field.step(now);
        }
        let p = field.particles().get(0).unwrap();
        assert!(p.position.x > start.x);
        assert_eq!(p.offset, Vec3::ZERO);
        assert_eq!(p.position, p.baseline);
    }

    #[test]
    fn test_lattice_seek_moves_toward_target() {
        let config = FieldConfig::lattice()
            .with_particle_count(50)
            .with_speed(0.0, 2.0)
            .with_jitter(0.0);
        let mut field = ParticleField::with_seed(config, Vec2::new(800.0, 600.0), 4);
        assert!(field.particles().iter().all(|p| p.assigned_target.is_some()));

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(400.0, 300.0)), now);
        for _ in 0..5 {
            let frame = field.step(now);
            assert!(frame.points.len() <= 50);
        }
        for p in field.particles().iter() {
            assert!(p.position.is_finite());
            if p.offset != Vec3::ZERO {
                let target = p.assigned_target.unwrap();
                assert!(p.position.distance(target) < p.baseline.distance(target));
            }
        }
    }

    #[test]
    fn test_line_mode_orders_particles_through_pointer() {
        let positions = [
            Vec3::new(90.0, 120.0, 0.0),
            Vec3::new(110.0, 80.0, 0.0),
            Vec3::new(100.0, 100.0, 0.0),
        ];
        let config = still(FieldConfig::constellation())
            .with_influence_radius(1.0e7)
            .with_strengths(1.0, 1.0)
            .with_align_mode(AlignMode::Line { spacing: 22.0 });
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        field.step(now);

        let xs: Vec<f32> = field.particles().iter().map(|p| p.position.x).collect();
        for (x, expected) in xs.iter().zip([178.0, 222.0, 200.0]) {
            assert!((x - expected).abs() < 1e-3, "x {x} != {expected}");
        }
        for p in field.particles().iter() {
            assert!((p.position.y - 150.0).abs() < 1e-3);
            assert!(p.line_locked);
        }
    }

    #[test]
    fn test_line_release_kicks_once_pointer_leaves() {
        let positions = [Vec3::new(90.0, 120.0, 0.0), Vec3::new(110.0, 80.0, 0.0)];
        let config = still(FieldConfig::constellation())
            .with_influence_radius(1.0e7)
            .with_align_mode(AlignMode::Line { spacing: 22.0 });
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        field.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        field.step(now);
        assert!(field.particles().iter().all(|p| p.velocity == Vec3::ZERO));

        field.handle_pointer(PointerEvent::leave(), now);
        field.step(now);
        assert!(field.particles().iter().all(|p| !p.line_locked));
        assert!(field.particles().iter().any(|p| p.velocity != Vec3::ZERO));

        // Nothing locked any more, so no further kicks
        let settled: Vec<Vec3> = field.particles().iter().map(|p| p.velocity).collect();
        field.step(now);
        let after: Vec<Vec3> = field.particles().iter().map(|p| p.velocity).collect();
        assert_eq!(settled, after);
    }

    #[test]
    fn test_debug_helpers_mark_pointer() {
        let positions = [Vec3::new(100.0, 100.0, 0.0)];
        let config = still(FieldConfig::constellation()).with_debug_helpers(true);
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        assert!(field.step(now).overlay_points.is_empty());

        field.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        let frame = field.step(now);
        assert_eq!(frame.points.len(), 1);
        assert_eq!(frame.overlay_points.len(), 1);
        assert_eq!(frame.overlay_points[0].position, Vec2::new(200.0, 150.0));
        let reach = frame.overlay_lines[0].a.distance(Vec2::new(200.0, 150.0));
        assert!((reach - 140.0).abs() < 1e-2);

        field.handle_pointer(PointerEvent::leave(), now);
        let frame = field.step(now);
        assert!(frame.overlay_points.is_empty() && frame.overlay_lines.is_empty());
    }

    #[test]
    fn test_ray_markers_grow_points_on_pointer_ray() {
        let positions = [Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 14.0, 0.0)];
        let config = FieldConfig::net_align().with_influence_radius(0.0);
        assert!(config.ray_markers);
        let mut field = ParticleField::from_positions(config, Vec2::new(400.0, 300.0), &positions);

        let now = Instant::now();
        field.step(now);
        assert_eq!(field.point_scales(), &[1.0, 1.0]);

        field.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        let radius = field.config().style.point_radius;
        let frame = field.step(now);
        assert!((frame.points[0].radius - radius * 2.5).abs() < 1e-4);
        assert_eq!(frame.points[1].radius, radius);
        assert!((field.point_scales()[0] - 2.5).abs() < 1e-4);

        field.handle_pointer(PointerEvent::leave(), now);
        field.step(now);
        assert_eq!(field.point_scales(), &[1.0, 1.0]);
    }

    #[test]
    fn test_external_baselines_round_trip() {
        let config = FieldConfig::net_align().with_influence_radius(0.0);
        let mut points = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.0, 2.0)];
        let mut field = ParticleField::from_positions(config, Vec2::new(320.0, 240.0), &points);

        points[0] = Vec3::new(5.0, 5.0, 5.0);
        field.sync_baselines(&points);
        field.step(Instant::now());

        let mut out = vec![Vec3::ZERO; 2];
        field.write_positions(&mut out);
        assert_eq!(out, points);
    }
}
