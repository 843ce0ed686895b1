use std::time::Duration;

/// Simulated network conditions applied to outgoing frames
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConditionerConfig {
    /// Delay added before every send
    pub latency: Duration,
    /// Random extra delay in `[0, jitter]` on top of `latency`
    pub jitter: Duration,
    /// Ratio of frames dropped, 0.0 ..= 1.0
    pub loss: f32,
}

impl LinkConditionerConfig {
    pub fn new(latency_ms: u64, jitter_ms: u64, loss: f32) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            jitter: Duration::from_millis(jitter_ms),
            loss: loss.clamp(0.0, 1.0),
        }
    }

    pub fn perfect_condition() -> Self {
        Self::new(0, 0, 0.0)
    }

    pub fn good_condition() -> Self {
        Self::new(40, 6, 0.002)
    }

    pub fn average_condition() -> Self {
        Self::new(100, 15, 0.02)
    }

    pub fn poor_condition() -> Self {
        Self::new(200, 30, 0.06)
    }

    /// Whether a frame should be dropped, given a uniform sample in `[0, 1)`
    pub fn should_drop(&self, sample: f32) -> bool {
        sample < self.loss
    }

    /// Delay for one frame, given a uniform sample in `[0, 1)`
    pub fn delay(&self, sample: f32) -> Duration {
        self.latency + self.jitter.mul_f32(sample.clamp(0.0, 1.0))
    }

    pub fn is_perfect(&self) -> bool {
        self.latency.is_zero() && self.jitter.is_zero() && self.loss <= 0.0
    }
}

impl Default for LinkConditionerConfig {
    fn default() -> Self {
        Self::perfect_condition()
    }
}
