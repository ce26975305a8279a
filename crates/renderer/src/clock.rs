use std::time::{Duration, Instant};

/// Minimum wall-clock spacing between drawn frames (60 FPS cap).
pub const MIN_FRAME_DELTA: Duration = Duration::from_micros(16_667);

/// Outcome of one animation callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTick {
    /// Draw this frame with the shader clock at `time_ms`.
    Draw { time_ms: f32 },
    /// Too soon since the last callback; skip the draw.
    Skip,
}

/// Frame pacing and the speed-scaled shader clock.
///
/// Every callback moves the reference timestamp, but only callbacks that
/// clear [`MIN_FRAME_DELTA`] advance the accumulated shader time. The
/// accumulator grows by `delta * speed`, so speed changes never cause the
/// animation to jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    speed: f32,
    last_tick: Instant,
    accumulated_ms: f64,
}

impl FrameClock {
    pub fn start(speed: f32, now: Instant) -> Self {
        Self {
            speed,
            last_tick: now,
            accumulated_ms: 0.0,
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current shader clock in milliseconds.
    pub fn time_ms(&self) -> f32 {
        self.accumulated_ms as f32
    }

    /// Whether enough wall time has passed to draw another frame.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_tick) >= MIN_FRAME_DELTA
    }

    /// Earliest instant at which the next frame may draw.
    pub fn next_deadline(&self) -> Instant {
        self.last_tick + MIN_FRAME_DELTA
    }

    /// Registers one callback at `now` and decides whether it draws.
    pub fn tick(&mut self, now: Instant) -> FrameTick {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        if delta < MIN_FRAME_DELTA {
            return FrameTick::Skip;
        }
        self.accumulated_ms += delta.as_secs_f64() * 1000.0 * f64::from(self.speed);
        FrameTick::Draw {
            time_ms: self.accumulated_ms as f32,
        }
    }
}
