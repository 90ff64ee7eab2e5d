//! Frame timing: delta time, frames per second and the share of the frame
//! budget spent in update and render.

use instant::{Duration, Instant};

/// Frame budget the update share is measured against (60 Hz).
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_667);

#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_frame: Instant,
    frame_start: Instant,
    second_start: Instant,
    delta: Duration,
    frame_work: Duration,
    frames_this_second: u32,
    fps: u32,
    budget: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            last_frame: now,
            frame_start: now,
            second_start: now,
            delta: Duration::ZERO,
            frame_work: Duration::ZERO,
            frames_this_second: 0,
            fps: 0,
            budget: TARGET_FRAME_TIME,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Marks the start of a frame and returns the time since the previous one.
    pub fn begin_frame(&mut self) -> Duration {
        self.begin_frame_at(Instant::now())
    }

    pub fn begin_frame_at(&mut self, now: Instant) -> Duration {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_start = now;
        self.delta
    }

    /// Marks the end of the frame's update and render work.
    pub fn end_frame(&mut self) {
        self.end_frame_at(Instant::now())
    }

    pub fn end_frame_at(&mut self, now: Instant) {
        self.frame_work = now.saturating_duration_since(self.frame_start);
        self.frames_this_second += 1;

        let elapsed = now.saturating_duration_since(self.second_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_start = now;
            log::trace!("{} fps, {:.2} ms per frame", self.fps, self.frame_time_ms());
        }
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Frames counted over the last full second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn frame_time_ms(&self) -> f32 {
        self.delta.as_secs_f32() * 1000.0
    }

    /// Time the last frame spent between `begin_frame` and `end_frame`.
    pub fn frame_work(&self) -> Duration {
        self.frame_work
    }

    /// Update and render time of the last frame as a percentage of the frame
    /// budget. Can exceed 100 on frames that overran.
    pub fn update_percentage(&self) -> f32 {
        if self.budget.is_zero() {
            return 0.0;
        }
        self.frame_work.as_secs_f32() / self.budget.as_secs_f32() * 100.0
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
