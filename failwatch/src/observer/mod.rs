//! The observer: detector loops, their event log, and waiting on it.

mod detection_mode;
#[allow(clippy::module_inception)]
mod observer;
mod observer_state;
mod wait;

pub use detection_mode::DetectionMode;
pub use observer::Observer;
pub use wait::Wait;
pub use wait::WaitError;
