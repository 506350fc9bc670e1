//! Frame timing - delta clamping and frame-rate measurement

use std::time::{Duration, Instant};

/// Deltas longer than this are treated as a stall
pub const MAX_FRAME_GAP: f32 = 0.1;

/// Delta substituted after a stall, roughly one 60 Hz frame
pub const STALL_FRAME_DELTA: f32 = 0.016;

/// Replace stalled or negative deltas so animations never jump
pub fn clamp_delta(delta: f32) -> f32 {
    if delta > MAX_FRAME_GAP || !delta.is_finite() {
        STALL_FRAME_DELTA
    } else {
        delta.max(0.0)
    }
}

/// Turns frame instants into clamped delta times
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta since the previous tick in seconds; the first tick yields 0
    pub fn tick(&mut self, now: Instant) -> f32 {
        let raw = match self.last {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        let delta = clamp_delta(raw);
        self.elapsed += delta as f64;
        self.frames += 1;
        delta
    }

    /// Sum of clamped deltas
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Frames per second over one-second windows
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            window_start: None,
            frames: 0,
            fps: 60.0,
        }
    }
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame; returns the new rate when a window closes
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let span = now.saturating_duration_since(start);
        if span < Self::WINDOW {
            return None;
        }
        self.fps = self.frames as f32 / span.as_secs_f32();
        self.frames = 0;
        self.window_start = Some(now);
        Some(self.fps)
    }

    /// Last measured rate (60 until the first window closes)
    pub fn fps(&self) -> f32 {
        self.fps
    }
}
