//! Frame-rate statistics for the overlay
//!
//! `tick` is called once per frame with the current clock reading. The
//! milliseconds panel tracks the time between consecutive ticks; the FPS
//! panel is refreshed once per second from the number of ticks seen.

use std::time::Duration;

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// A single overlay readout with its running extremes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            value: 0.0,
            min: f32::INFINITY,
            max: 0.0,
        }
    }
}

impl Panel {
    fn record(&mut self, value: f32) {
        self.value = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Whether at least one value has been recorded
    pub fn has_samples(&self) -> bool {
        self.min.is_finite()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub fps: Panel,
    pub ms: Panel,
    last_tick: Option<Duration>,
    window_start: Option<Duration>,
    frames: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at clock reading `now`
    pub fn tick(&mut self, now: Duration) {
        if let Some(last) = self.last_tick {
            let frame_time = now.saturating_sub(last);
            self.ms.record(frame_time.as_secs_f32() * 1000.0);
        }
        self.last_tick = Some(now);

        let window_start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.saturating_sub(window_start);
        if elapsed >= FPS_WINDOW {
            // The tick that opened the window belongs to the previous one
            let frames = self.frames.saturating_sub(1).max(1);
            self.fps.record(frames as f32 / elapsed.as_secs_f32());
            self.window_start = Some(now);
            self.frames = 1;
        }
    }

    /// One-line summary used by the overlay
    pub fn summary(&self) -> String {
        format!(
            "{:.0} FPS ({:.0}-{:.0})  {:.1} ms",
            self.fps.value,
            if self.fps.has_samples() { self.fps.min } else { 0.0 },
            self.fps.max,
            self.ms.value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_sixty_fps() {
        let mut stats = FrameStats::new();
        let frame = Duration::from_micros(16_667);

        for i in 0..=60u32 {
            stats.tick(frame * i);
        }

        assert!(stats.fps.has_samples());
        assert!((stats.fps.value - 60.0).abs() < 0.5, "fps = {}", stats.fps.value);
        assert!((stats.ms.value - 16.667).abs() < 0.01, "ms = {}", stats.ms.value);
    }

    #[test]
    fn test_first_tick_records_nothing() {
        let mut stats = FrameStats::new();
        stats.tick(Duration::from_secs(3));
        assert!(!stats.ms.has_samples());
        assert!(!stats.fps.has_samples());
    }

    #[test]
    fn test_tracks_extremes() {
        let mut stats = FrameStats::new();
        stats.tick(Duration::from_millis(0));
        stats.tick(Duration::from_millis(10));
        stats.tick(Duration::from_millis(50));
        stats.tick(Duration::from_millis(60));

        assert!((stats.ms.value - 10.0).abs() < 1e-4);
        assert!((stats.ms.min - 10.0).abs() < 1e-4);
        assert!((stats.ms.max - 40.0).abs() < 1e-4);
    }
}
