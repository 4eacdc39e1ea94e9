use std::time::{Duration, Instant};

pub const FRAME_HISTORY: usize = 256;

/// Measures the time between consecutive [`FrameClock::tick`] calls.
pub struct FrameClock {
    last: Option<Instant>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Time since the previous tick. The first tick returns zero.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = self
            .last
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last = Some(now);
        dt
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsSummary {
    pub low_1pct: f32,
    pub low_01pct: f32,
    pub peak: f32,
    pub min: f32,
    pub max: f32,
}

/// Rolling frame rate history.
pub struct FrameStats {
    history: [f32; FRAME_HISTORY],
    cursor: usize,
    frames: u64,
    last_frame_ms: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            history: [0.0; FRAME_HISTORY],
            cursor: 0,
            frames: 0,
            last_frame_ms: 0.0,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();
        self.last_frame_ms = secs * 1000.0;
        self.history[self.cursor] = if secs > 0.0 { 1.0 / secs } else { 0.0 };
        self.cursor = (self.cursor + 1) % FRAME_HISTORY;
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame_ms(&self) -> f32 {
        self.last_frame_ms
    }

    /// Value at `percentile` (0..=1) of the history. Slots not yet written
    /// count as zero fps.
    pub fn percentile(&self, percentile: f32) -> f32 {
        let mut sorted = self.history;
        sorted.sort_by(|a, b| a.total_cmp(b));
        let index = ((percentile * FRAME_HISTORY as f32) as i64).clamp(0, FRAME_HISTORY as i64 - 1);
        sorted[index as usize]
    }

    pub fn summary(&self) -> FpsSummary {
        FpsSummary {
            low_1pct: self.percentile(0.01),
            low_01pct: self.percentile(0.001),
            peak: self.percentile(0.999),
            min: self.percentile(0.0),
            max: self.percentile(1.0),
        }
    }
}
