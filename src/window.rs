//! Windowed host: runs a particle field in a winit window with a GPU surface.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::clock::FrameClock;
use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::gpu::{GpuProvider, GpuSurface};
use crate::lifecycle::{
    Environment, FieldController, FrameDriver, FrameRequest, InputSource, Phase, Registration,
};
use crate::pointer::PointerEvent;

/// Window settings for [`run`].
#[derive(Debug, Clone)]
pub struct WindowOptions {
    pub title: String,
    /// Logical size.
    pub width: u32,
    pub height: u32,
    pub environment: Environment,
    pub seed: Option<u64>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Particle Field".to_string(),
            width: 1280,
            height: 720,
            environment: Environment::default(),
            seed: None,
        }
    }
}

/// Frame callbacks via `request_redraw`. A cancelled request still produces
/// a redraw event; it is ignored because nothing is pending.
struct RedrawDriver {
    window: Arc<Window>,
    next: u64,
    pending: Option<FrameRequest>,
}

impl RedrawDriver {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next: 0,
            pending: None,
        }
    }
}

impl FrameDriver for RedrawDriver {
    fn request_frame(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.pending = Some(request);
        self.window.request_redraw();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending == Some(request) {
            self.pending = None;
        }
    }
}

/// winit always delivers window events; registrations decide which ones
/// reach the controller.
#[derive(Default)]
struct WindowInput {
    next: u64,
    pointer: Option<Registration>,
    resize: Option<Registration>,
}

impl WindowInput {
    fn register(&mut self) -> Registration {
        self.next += 1;
        Registration(self.next)
    }
}

impl InputSource for WindowInput {
    fn listen_pointer(&mut self) -> Registration {
        let registration = self.register();
        self.pointer = Some(registration);
        registration
    }

    fn observe_resize(&mut self) -> Option<Registration> {
        // `Resized` reports the surface's own size.
        let registration = self.register();
        self.resize = Some(registration);
        Some(registration)
    }

    fn listen_window_resize(&mut self) -> Registration {
        let registration = self.register();
        self.resize = Some(registration);
        registration
    }

    fn remove(&mut self, registration: Registration) {
        if self.pointer == Some(registration) {
            self.pointer = None;
        }
        if self.resize == Some(registration) {
            self.resize = None;
        }
    }
}

type WindowController = FieldController<GpuSurface, RedrawDriver, WindowInput>;

struct App {
    config: FieldConfig,
    options: WindowOptions,
    window: Option<Arc<Window>>,
    controller: Option<WindowController>,
    clock: FrameClock,
    error: Option<FieldError>,
}

impl App {
    fn new(config: FieldConfig, options: WindowOptions) -> Self {
        Self {
            config,
            options,
            window: None,
            controller: None,
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), FieldError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.options.width,
                self.options.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let mut controller = FieldController::new(
            self.config.clone(),
            RedrawDriver::new(Arc::clone(&window)),
            WindowInput::default(),
            self.options.environment,
        );
        if let Some(seed) = self.options.seed {
            controller = controller.with_seed(seed);
        }

        let phase = controller.start(&mut GpuProvider::new(Arc::clone(&window)));
        if phase == Phase::Uninitialized && controller.surface().is_none() {
            log::warn!("window open without a gpu surface, nothing will be drawn");
        }

        self.window = Some(window);
        self.controller = Some(controller);
        Ok(())
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(controller) = self.controller.as_mut() {
            controller.destroy();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create(event_loop) {
            log::error!("{e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.close(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(controller) = self.controller.as_mut() {
                    if controller.input().resize.is_some() {
                        controller.on_resize(Vec2::new(size.width as f32, size.height as f32));
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(controller) = self.controller.as_mut() else {
                    return;
                };
                if controller.driver().pending.is_none() {
                    return;
                }
                let now = self.clock.tick();
                controller.on_frame(now);
                if self.clock.frame() % 600 == 0 {
                    log::debug!("frame {} at {:.1} fps", self.clock.frame(), self.clock.fps());
                }
            }
            other => {
                let Some(controller) = self.controller.as_mut() else {
                    return;
                };
                if controller.input().pointer.is_none() {
                    return;
                }
                if let Some(pointer) = PointerEvent::from_window_event(&other) {
                    controller.on_pointer(pointer, Instant::now());
                }
            }
        }
    }
}

/// Open a window and run `config` in it until the window closes.
pub fn run(config: FieldConfig, options: WindowOptions) -> Result<(), FieldError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, options);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
