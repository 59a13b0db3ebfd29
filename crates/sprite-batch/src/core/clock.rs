use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick, clamped.
    pub dt: Duration,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots with a clamped delta.
///
/// The clamp keeps animation stable after stalls (debugger, minimised window).
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self { last: Instant::now(), frame_index: 0, dt_min, dt_max }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime { dt, now, frame_index: self.frame_index };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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

    #[test]
    fn delta_is_clamped_and_frames_counted() {
        let start = Instant::now();
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        clock.last = start;

        let a = clock.tick_at(start);
        assert_eq!(a.dt, Duration::from_millis(1));
        assert_eq!(a.frame_index, 0);

        let b = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(b.dt, Duration::from_millis(100));
        assert_eq!(b.frame_index, 1);

        let c = clock.tick_at(start + Duration::from_secs(5) + Duration::from_millis(16));
        assert_eq!(c.dt, Duration::from_millis(16));
    }
}
