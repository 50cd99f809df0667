use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The lifecycle of an [`Observer`](crate::Observer).
pub(crate) enum ObserverState {
    /// Never started, or reset after a stop.
    Idle,

    /// Detector loops are running.
    Running {
        tx_shutdown: watch::Sender<bool>,
        handles: Vec<JoinHandle<()>>,
    },

    /// Loops are stopped; the event log is kept for reading.
    Stopped,
}

impl ObserverState {
    pub(crate) fn is_running(&self) -> bool {
        matches!(self, ObserverState::Running { .. })
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ObserverState::Idle => "Idle",
            ObserverState::Running { .. } => "Running",
            ObserverState::Stopped => "Stopped",
        }
    }
}
