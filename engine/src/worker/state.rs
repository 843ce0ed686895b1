/// Lifecycle of a worker. Transitions only move forward
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, no transport yet
    Unbound,
    /// Transport attached, heartbeat running
    Bound,
    /// `disconnect` is tearing the worker down
    EndingSession,
    /// Torn down, all traffic is dropped
    Disposed,
}

impl WorkerState {
    /// Whether incoming frames should still be processed
    pub fn accepts_traffic(self) -> bool {
        matches!(self, WorkerState::Unbound | WorkerState::Bound)
    }
}
