//! Wall-clock frame timing.
//!
//! The scene runs one simulation update per rendered frame, so the clock hands
//! out the raw wall-clock delta since the previous tick. Deltas are never
//! clamped: a window that was minimized or suspended produces one large delta
//! and every consumer must cope with it. Long frames are logged so they show up
//! when chasing hitches.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;
const LONG_FRAME_SECS: f64 = 0.25;

pub struct Clock {
    last_instant: Instant,
    pub frame_count: u64,
    pub real_dt: f64,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            last_instant: start,
            frame_count: 0,
            real_dt: 0.0,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Seconds since the previous tick, measured against the current instant.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Seconds since the previous tick, measured against `now`.
    ///
    /// An instant earlier than the last observed one yields a zero delta and
    /// leaves the stored instant untouched.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let dt = now
            .checked_duration_since(self.last_instant)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        if now > self.last_instant {
            self.last_instant = now;
        }

        if dt > LONG_FRAME_SECS {
            log::warn!("Long frame: {:.1}ms since previous tick", dt * 1000.0);
        }

        self.real_dt = dt;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };

        dt
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
