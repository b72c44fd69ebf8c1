//! Frame timing for hosts that drive a field.
//!
//! A [`FrameClock`] hands out the timestamp each frame should be stepped
//! with, counts frames and keeps a rolling FPS figure. Real-time clocks read
//! [`Instant::now`]; fixed clocks advance by a constant step, which makes
//! headless runs reproducible.
//!
//! ```ignore
//! let mut clock = FrameClock::fixed(Duration::from_secs_f64(1.0 / 60.0));
//! for _ in 0..120 {
//!     let now = clock.tick();
//!     controller.on_frame(now);
//! }
//! println!("{} frames, {:.1} fps", clock.frame(), clock.fps());
//! ```

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    /// Timestamp of the latest frame.
    now: Instant,
    /// `None` for real time.
    fixed_step: Option<Duration>,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    /// A clock that follows wall time.
    pub fn new() -> Self {
        Self::starting_at(Instant::now(), None)
    }

    /// A clock that advances by `step` on every tick.
    pub fn fixed(step: Duration) -> Self {
        Self::starting_at(Instant::now(), Some(step))
    }

    fn starting_at(start: Instant, fixed_step: Option<Duration>) -> Self {
        Self {
            start,
            now: start,
            fixed_step,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: start,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Start a new frame and return its timestamp.
    pub fn tick(&mut self) -> Instant {
        self.now = match self.fixed_step {
            Some(step) => self.now + step,
            None => Instant::now().max(self.now),
        };
        self.frame_count += 1;

        let since = self.now.duration_since(self.fps_update_time);
        if since >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = self.now;
        }

        self.now
    }

    /// Timestamp of the latest frame (the start time before the first tick).
    #[inline]
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Frames ticked so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn elapsed(&self) -> Duration {
        self.now.duration_since(self.start)
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_step.is_some()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.fps(), 0.0);
        assert!(!clock.is_fixed());
    }

    #[test]
    fn test_real_time_tick() {
        let mut clock = FrameClock::new();
        let before = clock.now();
        thread::sleep(Duration::from_millis(5));
        let now = clock.tick();

        assert!(now > before);
        assert_eq!(clock.frame(), 1);
        assert!(clock.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_fixed_step_is_exact() {
        let step = Duration::from_millis(20);
        let mut clock = FrameClock::fixed(step);
        let start = clock.now();
        for _ in 0..10 {
            clock.tick();
        }
        assert_eq!(clock.now() - start, step * 10);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_fixed_fps() {
        let mut clock = FrameClock::fixed(Duration::from_secs_f64(1.0 / 60.0));
        for _ in 0..40 {
            clock.tick();
        }
        assert!((clock.fps() - 60.0).abs() < 0.5, "fps was {}", clock.fps());
    }
}
