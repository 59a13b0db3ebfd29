use std::fmt;
use std::time::{Duration, Instant};

/// Counters for a single flush.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FlushStats {
    pub commands: usize,
    pub draw_calls: usize,
    pub sort_time: Duration,
    pub render_time: Duration,
}

/// Counters accumulated over a frame (every flush since the last
/// [`BatchEngine::begin_frame`](super::BatchEngine::begin_frame)).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameMetrics {
    pub total_commands: usize,
    pub draw_calls: usize,
    pub flushes: usize,
    pub sort_time: Duration,
    pub render_time: Duration,
}

impl FrameMetrics {
    #[inline]
    pub fn record(&mut self, flush: &FlushStats) {
        self.total_commands += flush.commands;
        self.draw_calls += flush.draw_calls;
        self.flushes += 1;
        self.sort_time += flush.sort_time;
        self.render_time += flush.render_time;
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for FrameMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Commands: {}\nDrawCalls: {}\nFlushes: {}\nSort: {:.3}ms\nRender: {:.3}ms",
            self.total_commands,
            self.draw_calls,
            self.flushes,
            self.sort_time.as_secs_f64() * 1000.0,
            self.render_time.as_secs_f64() * 1000.0,
        )
    }
}

/// Runs `f` and returns its result with the elapsed wall time.
#[inline]
pub(super) fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}
