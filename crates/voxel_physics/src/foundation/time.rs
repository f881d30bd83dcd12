//! Simulation time keeping

/// Fixed-step simulation clock
///
/// Tracks the simulated time that event timestamps are stamped with. The
/// physics core never reads the wall clock; callers feed the frame delta.
#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    total_time: f64,
    frame_count: u64,
    last_delta: f32,
}

impl SimulationClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one frame of `delta_time` seconds.
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn advance(&mut self, delta_time: f32) {
        let dt = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.last_delta = dt;
        self.total_time += f64::from(dt);
        self.frame_count += 1;
    }

    /// Total simulated time in seconds
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Delta of the most recent frame
    pub fn delta_time(&self) -> f32 {
        self.last_delta
    }

    /// Number of frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
