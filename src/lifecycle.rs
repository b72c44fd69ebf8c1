//! Field lifecycle: acquiring a surface, running the frame loop and tearing
//! everything down again.
//!
//! ```text
//! Uninitialized ──start──▶ Running ──destroy──▶ Destroyed
//!       │                                           ▲
//!       └──────────────────destroy──────────────────┘
//! ```
//!
//! The controller never owns a loop. It asks its [`FrameDriver`] for one
//! callback at a time and the host calls [`FieldController::on_frame`] when
//! that callback fires. Input and resize handlers only record state; the
//! next frame picks it up.
//!
//! # Example
//!
//! ```ignore
//! let mut controller = FieldController::new(
//!     FieldConfig::constellation(),
//!     ManualFrameDriver::new(),
//!     DetachedInput::new(),
//!     Environment::default(),
//! );
//! controller.start(&mut RasterProvider::new(800, 600));
//! while controller.driver().pending().is_some() {
//!     controller.on_frame(Instant::now());
//! }
//! controller.destroy();
//! ```

use std::time::Instant;

use glam::Vec2;

use crate::config::FieldConfig;
use crate::field::ParticleField;
use crate::pointer::PointerEvent;
use crate::render::DrawList;

/// Something a field can draw into.
pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> Vec2;
    fn present(&mut self, frame: &DrawList);
    /// Free any graphics resources. Called once, on destroy.
    fn release(&mut self);
}

/// Hands out a surface, or nothing if drawing is unsupported.
pub trait SurfaceProvider {
    type Surface: Surface;
    fn acquire(&mut self) -> Option<Self::Surface>;
}

/// Handle for a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// "Call me once before the next paint", and its cancellation.
pub trait FrameDriver {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Handle for a registered listener or observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Registration(pub u64);

/// Source of pointer and resize notifications.
pub trait InputSource {
    fn listen_pointer(&mut self) -> Registration;
    /// Observe the surface's own size. `None` if unsupported.
    fn observe_resize(&mut self) -> Option<Registration>;
    /// Fallback when the surface cannot be observed directly.
    fn listen_window_resize(&mut self) -> Registration;
    fn remove(&mut self, registration: Registration);
}

/// Host preferences read once at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Environment {
    /// Draw one still frame and never animate.
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Running,
    /// Terminal.
    Destroyed,
}

/// Drives one [`ParticleField`] through its lifecycle.
pub struct FieldController<S, D, I> {
    phase: Phase,
    config: FieldConfig,
    seed: Option<u64>,
    environment: Environment,
    field: Option<ParticleField>,
    surface: Option<S>,
    driver: D,
    input: I,
    pending_frame: Option<FrameRequest>,
    registrations: Vec<Registration>,
}

impl<S, D, I> FieldController<S, D, I>
where
    S: Surface,
    D: FrameDriver,
    I: InputSource,
{
    pub fn new(config: FieldConfig, driver: D, input: I, environment: Environment) -> Self {
        Self {
            phase: Phase::Uninitialized,
            config,
            seed: None,
            environment,
            field: None,
            surface: None,
            driver,
            input,
            pending_frame: None,
            registrations: Vec::new(),
        }
    }

    /// Seed the field's randomness, for reproducible output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn field(&self) -> Option<&ParticleField> {
        self.field.as_ref()
    }

    pub fn field_mut(&mut self) -> Option<&mut ParticleField> {
        self.field.as_mut()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Acquire a surface, seed the field and start the frame loop.
    ///
    /// Does nothing once started or destroyed. Without a surface the
    /// controller stays uninitialized and schedules nothing. With reduced
    /// motion it draws one still frame and stays uninitialized.
    pub fn start<P>(&mut self, provider: &mut P) -> Phase
    where
        P: SurfaceProvider<Surface = S>,
    {
        if self.phase != Phase::Uninitialized || self.field.is_some() {
            return self.phase;
        }
        let Some(mut surface) = provider.acquire() else {
            log::warn!("no drawing surface available, particle field not started");
            return self.phase;
        };

        let size = surface.size();
        let config = self.config.clone();
        let mut field = match self.seed {
            Some(seed) => ParticleField::with_seed(config, size, seed),
            None => ParticleField::new(config, size),
        };

        if self.environment.reduced_motion {
            surface.present(field.render());
            log::debug!("reduced motion: drew a still frame, animation not started");
            self.field = Some(field);
            self.surface = Some(surface);
            return self.phase;
        }

        self.registrations.push(self.input.listen_pointer());
        let resize = match self.input.observe_resize() {
            Some(registration) => registration,
            None => self.input.listen_window_resize(),
        };
        self.registrations.push(resize);

        self.field = Some(field);
        self.surface = Some(surface);
        self.pending_frame = Some(self.driver.request_frame());
        self.phase = Phase::Running;
        log::debug!("particle field running at {}x{}", size.x, size.y);
        self.phase
    }

    /// Run one step and present it, then schedule the next frame.
    pub fn on_frame(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        self.pending_frame = None;
        if let (Some(field), Some(surface)) = (self.field.as_mut(), self.surface.as_mut()) {
            surface.present(field.step(now));
        }
        self.pending_frame = Some(self.driver.request_frame());
    }

    /// Record a pointer event for the next frame.
    pub fn on_pointer(&mut self, event: PointerEvent, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        if let Some(field) = self.field.as_mut() {
            field.handle_pointer(event, now);
        }
    }

    /// Record a new surface size for the next frame.
    pub fn on_resize(&mut self, size: Vec2) {
        if self.phase != Phase::Running {
            return;
        }
        if let Some(field) = self.field.as_mut() {
            field.resize(size);
        }
    }

    /// Cancel the pending frame, remove every registration and release the
    /// surface. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        if let Some(request) = self.pending_frame.take() {
            self.driver.cancel_frame(request);
        }
        for registration in self.registrations.drain(..) {
            self.input.remove(registration);
        }
        if let Some(mut surface) = self.surface.take() {
            surface.release();
        }
        self.field = None;
        self.phase = Phase::Destroyed;
        log::debug!("particle field destroyed");
    }
}

/// Frame driver for hosts that pump frames themselves (headless rendering,
/// tests). Remembers the one outstanding request.
#[derive(Debug, Default)]
pub struct ManualFrameDriver {
    next: u64,
    pending: Option<FrameRequest>,
    cancelled: usize,
}

impl ManualFrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// How many requests have been made in total.
    pub fn requested(&self) -> u64 {
        self.next
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameDriver for ManualFrameDriver {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

/// Input source not wired to any event system. Hands out registrations and
/// tracks which are still live; events are fed to the controller directly.
#[derive(Debug)]
pub struct DetachedInput {
    observes_resize: bool,
    next: u64,
    live: Vec<Registration>,
    window_resize: bool,
}

impl DetachedInput {
    pub fn new() -> Self {
        Self {
            observes_resize: true,
            next: 0,
            live: Vec::new(),
            window_resize: false,
        }
    }

    /// An input source that can only listen for window resizes.
    pub fn without_resize_observer() -> Self {
        Self {
            observes_resize: false,
            ..Self::new()
        }
    }

    pub fn live(&self) -> &[Registration] {
        &self.live
    }

    /// Whether the window-resize fallback was used.
    pub fn uses_window_resize(&self) -> bool {
        self.window_resize
    }

    fn register(&mut self) -> Registration {
        self.next += 1;
        let registration = Registration(self.next);
        self.live.push(registration);
        registration
    }
}

impl Default for DetachedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for DetachedInput {
    fn listen_pointer(&mut self) -> Registration {
        self.register()
    }

    fn observe_resize(&mut self) -> Option<Registration> {
        self.observes_resize.then(|| self.register())
    }

    fn listen_window_resize(&mut self) -> Registration {
        self.window_resize = true;
        self.register()
    }

    fn remove(&mut self, registration: Registration) {
        self.live.retain(|r| *r != registration);
    }
}
