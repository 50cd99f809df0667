//! Detected events and the log that records them.

#[allow(clippy::module_inception)]
mod event;
mod event_kind;
mod event_log;
mod subject;


pub use event::Event;
pub use event_kind::EventKind;
pub use event_log::EventLog;
pub use subject::Subject;
