//! Pointer tracking.
//!
//! [`PointerTracker`] folds raw enter/move/leave/down/up/cancel events into
//! one [`PointerState`]. Handlers only write state; the field reads it once
//! per step after [`PointerTracker::begin_frame`] has expired any stale press
//! window.
//!
//! Press strength is time-based rather than button-based: a press arms a
//! window of `press_duration` from press-down, and the window stays armed
//! through a release until it runs out.
//!
//! ```ignore
//! let mut tracker = PointerTracker::new();
//! tracker.handle(PointerEvent::down(Vec2::new(40.0, 60.0)), now, press_duration);
//! tracker.handle(PointerEvent::up(), now, press_duration);
//! assert!(tracker.press_active(now));
//! ```

use std::time::{Duration, Instant};

use glam::Vec2;
use winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};

/// Device that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Enter,
    Move,
    Leave,
    Down,
    Up,
    Cancel,
}

/// One normalized pointer event, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    /// Absent for events that carry no coordinates (a mouse button, leaving
    /// the window).
    pub position: Option<Vec2>,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, position: Option<Vec2>, kind: PointerKind) -> Self {
        Self { phase, position, kind }
    }

    pub fn enter(position: Vec2) -> Self {
        Self::new(PointerPhase::Enter, Some(position), PointerKind::Mouse)
    }

    pub fn moved(position: Vec2) -> Self {
        Self::new(PointerPhase::Move, Some(position), PointerKind::Mouse)
    }

    pub fn leave() -> Self {
        Self::new(PointerPhase::Leave, None, PointerKind::Mouse)
    }

    pub fn down(position: Vec2) -> Self {
        Self::new(PointerPhase::Down, Some(position), PointerKind::Mouse)
    }

    pub fn up() -> Self {
        Self::new(PointerPhase::Up, None, PointerKind::Mouse)
    }

    pub fn cancel() -> Self {
        Self::new(PointerPhase::Cancel, None, PointerKind::Mouse)
    }

    pub fn with_kind(self, kind: PointerKind) -> Self {
        Self { kind, ..self }
    }

    /// Translate a winit window event.
    ///
    /// Mouse buttons other than the primary one are ignored. Touch events
    /// map started/moved/ended/cancelled onto down/move/up/cancel.
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::CursorMoved { position, .. } => Some(Self::moved(Vec2::new(
                position.x as f32,
                position.y as f32,
            ))),
            WindowEvent::CursorEntered { .. } => {
                Some(Self::new(PointerPhase::Enter, None, PointerKind::Mouse))
            }
            WindowEvent::CursorLeft { .. } => Some(Self::leave()),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(match state {
                ElementState::Pressed => Self::new(PointerPhase::Down, None, PointerKind::Mouse),
                ElementState::Released => Self::up(),
            }),
            WindowEvent::Touch(touch) => Some(Self::from_touch(touch)),
            _ => None,
        }
    }

    fn from_touch(touch: &Touch) -> Self {
        let phase = match touch.phase {
            TouchPhase::Started => PointerPhase::Down,
            TouchPhase::Moved => PointerPhase::Move,
            TouchPhase::Ended => PointerPhase::Up,
            TouchPhase::Cancelled => PointerPhase::Cancel,
        };
        let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        Self::new(phase, Some(position), PointerKind::Touch)
    }
}

/// Pointer state shared between event handlers and the step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub screen_position: Vec2,
    /// Over the surface, or pressed.
    pub active: bool,
    pub pressed: bool,
    /// Whether the pointer is over the surface, independent of pressing.
    pub inside: bool,
    pub press_active_until: Option<Instant>,
    pub kind: PointerKind,
}

/// Folds pointer events into a [`PointerState`].
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Apply one event. `press_duration` arms the press window on `Down`.
    pub fn handle(&mut self, event: PointerEvent, now: Instant, press_duration: Duration) {
        let s = &mut self.state;
        if let Some(position) = event.position {
            s.screen_position = position;
        }
        match event.phase {
            PointerPhase::Enter | PointerPhase::Move => {
                s.active = true;
                s.inside = true;
                s.kind = event.kind;
            }
            PointerPhase::Leave => {
                s.inside = false;
                s.active = s.pressed;
            }
            PointerPhase::Down => {
                s.pressed = true;
                s.active = true;
                s.kind = event.kind;
                s.press_active_until = Some(now + press_duration);
            }
            PointerPhase::Up => {
                s.pressed = false;
                // A lifted finger is gone; a released mouse is still hovering
                s.active = s.inside && event.kind != PointerKind::Touch;
                if event.kind == PointerKind::Touch {
                    s.inside = false;
                }
            }
            PointerPhase::Cancel => {
                s.pressed = false;
                s.active = false;
                s.inside = false;
            }
        }
    }

    /// Expire the press window if `now` is past it.
    pub fn begin_frame(&mut self, now: Instant) {
        if let Some(until) = self.state.press_active_until {
            if now > until {
                self.state.press_active_until = None;
            }
        }
    }

    /// Whether press strength applies at `now`.
    pub fn press_active(&self, now: Instant) -> bool {
        self.state.press_active_until.is_some_and(|until| now <= until)
    }

    /// Forget everything but the last position.
    pub fn disable(&mut self) {
        self.state = PointerState {
            screen_position: self.state.screen_position,
            kind: self.state.kind,
            ..PointerState::default()
        };
    }
}
