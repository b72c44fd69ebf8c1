//! Local cluster alignment for an external network effect.
//!
//! A network effect owns its points, camera and line mesh and runs its own
//! step. If it exposes a [`HookRegistry`], [`ClusterAlign::attach`] registers
//! a post-step hook that runs the effect's points through an
//! [`Integration::External`] field: baselines come from the effect's
//! simulated points, the field adds pointer influence, and the aligned
//! positions, sprite scales and link lines go into the effect's draw
//! buffers. The simulated points themselves are never written, so the
//! effect's own motion is unaffected and offsets ease back to it.
//!
//! ```ignore
//! let Some(mut align) = ClusterAlign::attach(&mut effect, FieldConfig::net_align()) else {
//!     // No hook support: leave the effect alone.
//!     return;
//! };
//! align.handle_pointer(PointerEvent::moved(cursor), Instant::now());
//! effect.step(Instant::now());
//! align.destroy(&mut effect);
//! ```
//!
//! [`Integration::External`]: crate::config::Integration::External

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::config::{AlignMode, FieldConfig, FieldOptions, Integration};
use crate::field::ParticleField;
use crate::pointer::{PointerEvent, PointerPhase};
use crate::render::DrawList;

/// What an effect shows its hooks after each of its own steps.
///
/// Before running hooks the effect fills `rendered` with `points` and
/// `scales` with 1, then draws from `rendered`, `scales` and `lines`.
pub struct EffectFrame<'a> {
    /// The effect's simulated positions, indexed the same way every frame.
    pub points: &'a [Vec3],
    /// Where each point is drawn this frame. Same length as `points`.
    pub rendered: &'a mut [Vec3],
    /// Sprite scale per point. Same length as `points`.
    pub scales: &'a mut [f32],
    pub camera: &'a Camera,
    /// Drawable size in pixels.
    pub viewport: Vec2,
    /// The effect's own link distance, in world units.
    pub link_distance: f32,
    /// The effect's line list and overlay, rebuilt by hooks that move
    /// points.
    pub lines: &'a mut DrawList,
    pub now: Instant,
}

pub type PostStepHook = Box<dyn FnMut(&mut EffectFrame<'_>)>;

/// Identifies a registered hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Hooks an effect runs, in registration order, after each step.
#[derive(Default)]
pub struct HookRegistry {
    next: u64,
    hooks: Vec<(HookId, PostStepHook)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: PostStepHook) -> HookId {
        self.next += 1;
        let id = HookId(self.next);
        self.hooks.push((id, hook));
        id
    }

    /// Remove a hook. Returns false if it was not registered.
    pub fn remove(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(h, _)| *h != id);
        self.hooks.len() != before
    }

    pub fn run(&mut self, frame: &mut EffectFrame<'_>) {
        for (_, hook) in &mut self.hooks {
            hook(frame);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// A force-directed point network rendered by someone else.
pub trait NetworkEffect {
    /// Current point positions.
    fn points(&self) -> &[Vec3];

    /// Post-step hooks, if the effect supports them.
    fn post_step_hooks(&mut self) -> Option<&mut HookRegistry>;
}

struct AlignState {
    field: ParticleField,
    enabled: bool,
    /// Size set through [`ClusterAlign::resize`], used instead of the
    /// effect's own.
    viewport: Option<Vec2>,
}

impl AlignState {
    fn apply(&mut self, frame: &mut EffectFrame<'_>) {
        let field = &mut self.field;
        field.set_camera(*frame.camera);
        field.resize(self.viewport.unwrap_or(frame.viewport));
        if field.config().link_distance != frame.link_distance {
            field.reconfigure(&FieldOptions {
                link_distance: Some(frame.link_distance),
                ..Default::default()
            });
        }
        field.sync_baselines(frame.points);

        let drawn = field.step(frame.now);
        let out = &mut *frame.lines;
        out.lines.clear();
        out.lines.extend_from_slice(&drawn.lines);
        out.overlay_lines.clear();
        out.overlay_lines.extend_from_slice(&drawn.overlay_lines);
        out.overlay_points.clear();
        out.overlay_points.extend_from_slice(&drawn.overlay_points);

        field.write_positions(frame.rendered);
        for (scale, &s) in frame.scales.iter_mut().zip(field.point_scales()) {
            *scale = s;
        }
    }
}

/// Controller for alignment attached to one effect.
pub struct ClusterAlign {
    state: Rc<RefCell<AlignState>>,
    hook: Option<HookId>,
}

impl ClusterAlign {
    /// Register alignment on `effect`.
    ///
    /// Returns `None`, after logging a warning, if the effect has no hook
    /// registry. The effect is left untouched in that case.
    pub fn attach<E>(effect: &mut E, config: FieldConfig) -> Option<Self>
    where
        E: NetworkEffect + ?Sized,
    {
        let config = config.with_integration(Integration::External);
        let field = ParticleField::from_positions(config, Vec2::ZERO, effect.points());

        let Some(hooks) = effect.post_step_hooks() else {
            log::warn!("network effect has no post-step hooks, cluster alignment not attached");
            return None;
        };

        let state = Rc::new(RefCell::new(AlignState {
            field,
            enabled: true,
            viewport: None,
        }));
        let shared = Rc::clone(&state);
        let hook = hooks.register(Box::new(move |frame: &mut EffectFrame<'_>| {
            let mut state = shared.borrow_mut();
            if state.enabled {
                state.apply(frame);
            }
        }));

        Some(Self {
            state,
            hook: Some(hook),
        })
    }

    /// Record a pointer event. While disabled, only events that end a
    /// gesture are recorded.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        let mut state = self.state.borrow_mut();
        let starts = matches!(
            event.phase,
            PointerPhase::Enter | PointerPhase::Move | PointerPhase::Down
        );
        if !state.enabled && starts {
            return;
        }
        state.field.handle_pointer(event, now);
    }

    /// Use `viewport` instead of the size the effect reports, from the next
    /// step on.
    pub fn resize(&mut self, viewport: Vec2) {
        self.state.borrow_mut().viewport = Some(viewport);
    }

    pub fn reconfigure(&mut self, options: &FieldOptions) {
        self.state.borrow_mut().field.reconfigure(options);
    }

    pub fn set_align_mode(&mut self, mode: AlignMode) {
        self.state.borrow_mut().field.set_align_mode(mode);
    }

    pub fn enable(&mut self) {
        self.state.borrow_mut().enabled = true;
    }

    /// Stop influencing points and forget the pointer.
    pub fn disable(&mut self) {
        let mut state = self.state.borrow_mut();
        state.enabled = false;
        state.field.release_pointer();
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn is_attached(&self) -> bool {
        self.hook.is_some()
    }

    /// Current settings.
    pub fn config(&self) -> FieldConfig {
        self.state.borrow().field.config().clone()
    }

    /// Unregister the hook from `effect`. Safe to call more than once.
    pub fn destroy<E>(&mut self, effect: &mut E)
    where
        E: NetworkEffect + ?Sized,
    {
        self.state.borrow_mut().enabled = false;
        let Some(hook) = self.hook.take() else {
            return;
        };
        if let Some(hooks) = effect.post_step_hooks() {
            hooks.remove(hook);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Axis;

    const HOME: [Vec3; 2] = [Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0)];

    struct Net {
        points: Vec<Vec3>,
        /// Applied to every point at the start of each step.
        velocity: Vec3,
        rendered: Vec<Vec3>,
        scales: Vec<f32>,
        camera: Camera,
        lines: DrawList,
        hooks: Option<HookRegistry>,
    }

    impl Net {
        fn new(hooks: bool) -> Self {
            Self {
                points: HOME.to_vec(),
                velocity: Vec3::ZERO,
                rendered: HOME.to_vec(),
                scales: vec![1.0; HOME.len()],
                camera: Camera::orbit(35.0, 50.0),
                lines: DrawList::new(),
                hooks: hooks.then(HookRegistry::new),
            }
        }

        fn step(&mut self, now: Instant) {
            for point in &mut self.points {
                *point += self.velocity;
            }
            self.rendered.copy_from_slice(&self.points);
            self.scales.fill(1.0);
            if let Some(hooks) = self.hooks.as_mut() {
                let mut frame = EffectFrame {
                    points: &self.points,
                    rendered: &mut self.rendered,
                    scales: &mut self.scales,
                    camera: &self.camera,
                    viewport: Vec2::new(400.0, 300.0),
                    link_distance: 22.0,
                    lines: &mut self.lines,
                    now,
                };
                hooks.run(&mut frame);
            }
        }
    }

    impl NetworkEffect for Net {
        fn points(&self) -> &[Vec3] {
            &self.points
        }

        fn post_step_hooks(&mut self) -> Option<&mut HookRegistry> {
            self.hooks.as_mut()
        }
    }

    fn config() -> FieldConfig {
        FieldConfig::net_align().with_align_mode(AlignMode::Axis(Axis::X))
    }

    #[test]
    fn test_attach_without_hooks() {
        let mut net = Net::new(false);
        assert!(ClusterAlign::attach(&mut net, config()).is_none());
        assert_eq!(net.points[0], Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_hook_pulls_points_toward_pointer() {
        let mut net = Net::new(true);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();
        assert_eq!(net.hooks.as_ref().unwrap().len(), 1);

        let now = Instant::now();
        align.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        net.step(now);

        assert!(net.rendered[0].x < 5.0 && net.rendered[0].x > 0.0);
        assert_eq!(net.rendered[0].y, 0.0);
        assert_eq!(net.points, HOME);
        assert_eq!(net.lines.lines.len(), 1);
    }

    #[test]
    fn test_points_return_home_after_leave() {
        let mut net = Net::new(true);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();

        let now = Instant::now();
        align.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        for _ in 0..10 {
            net.step(now);
        }
        assert_ne!(net.rendered, HOME.to_vec());
        assert_eq!(net.points, HOME);

        align.handle_pointer(PointerEvent::leave(), now);
        for _ in 0..300 {
            net.step(now);
        }
        assert_eq!(net.rendered, HOME.to_vec());
        assert_eq!(net.points, HOME);
    }

    #[test]
    fn test_offsets_follow_moving_effect() {
        let mut net = Net::new(true);
        net.velocity = Vec3::new(0.0, 0.01, 0.0);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();

        let now = Instant::now();
        align.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        for _ in 0..10 {
            net.step(now);
        }
        align.handle_pointer(PointerEvent::leave(), now);
        for _ in 0..300 {
            net.step(now);
        }
        // The effect's motion is untouched and drawing settles back onto it
        assert!((net.points[1].y - (3.0 + 310.0 * 0.01)).abs() < 1e-3);
        assert_eq!(net.rendered, net.points);
    }

    #[test]
    fn test_explicit_resize_overrides_effect_size() {
        let mut net = Net::new(true);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();

        net.step(Instant::now());
        assert_eq!(align.state.borrow().field.viewport(), Vec2::new(400.0, 300.0));

        align.resize(Vec2::new(800.0, 600.0));
        net.step(Instant::now());
        net.step(Instant::now());
        assert_eq!(align.state.borrow().field.viewport(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_hook_fills_scales_and_helpers() {
        let mut net = Net::new(true);
        let config = config().with_debug_helpers(true);
        let mut align = ClusterAlign::attach(&mut net, config).unwrap();

        let now = Instant::now();
        net.step(now);
        assert_eq!(net.scales, vec![1.0, 1.0]);
        assert!(net.lines.overlay_points.is_empty());

        // Both points sit within 5 world units of the ray through the centre
        align.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        net.step(now);
        assert!(net.scales.iter().all(|&s| (s - 2.5).abs() < 1e-3));
        assert_eq!(net.lines.overlay_points.len(), 1);
        assert!(!net.lines.overlay_lines.is_empty());

        align.disable();
        net.step(now);
        assert_eq!(net.scales, vec![1.0, 1.0]);
        assert_eq!(net.rendered, net.points);
    }

    #[test]
    fn test_disabled_hook_is_noop() {
        let mut net = Net::new(true);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();
        align.disable();
        assert!(!align.is_enabled());

        let now = Instant::now();
        align.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        net.step(now);
        assert_eq!(net.rendered[0], Vec3::new(5.0, 0.0, 0.0));
        assert!(net.lines.lines.is_empty());

        align.enable();
        align.handle_pointer(PointerEvent::moved(Vec2::new(200.0, 150.0)), now);
        net.step(now);
        assert!(net.rendered[0].x < 5.0);
    }

    #[test]
    fn test_destroy_unregisters_once() {
        let mut net = Net::new(true);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();
        align.destroy(&mut net);
        assert!(!align.is_attached());
        assert!(net.hooks.as_ref().unwrap().is_empty());

        align.destroy(&mut net);
        net.step(Instant::now());
        assert_eq!(net.rendered[0], Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_reconfigure_through_controller() {
        let mut net = Net::new(true);
        let mut align = ClusterAlign::attach(&mut net, config()).unwrap();
        align.reconfigure(&FieldOptions::from_json(r#"{"alignMode": "grid", "gridSize": 0.5}"#).unwrap());
        assert_eq!(align.config().align_mode(), AlignMode::Grid { cell: 1.0 });

        align.set_align_mode(AlignMode::Flow { curl: 2.0 });
        assert_eq!(align.config().align_mode(), AlignMode::Flow { curl: 2.0 });
    }
}
