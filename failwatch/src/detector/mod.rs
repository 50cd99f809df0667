//! Detector loops.
//!
//! Each detector watches one kind of transition. A [`DetectorLoop`] calls
//! [`Detector::tick`] every poll interval until the detector reports
//! [`Progress::Done`] or the loop is told to shut down.

mod detector_loop;
mod election;
mod failure;
mod member_watch;
mod restoration;


pub(crate) use detector_loop::DetectorLoop;
pub(crate) use election::ElectionDetector;
pub(crate) use failure::FailureDetector;
pub(crate) use member_watch::MemberWatch;
pub(crate) use restoration::RestorationDetector;

use openraft_macros::add_async_trait;

/// Whether a detector wants to be polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Pending,
    Done,
}

#[add_async_trait]
pub(crate) trait Detector: Send + 'static {
    fn name(&self) -> String;

    /// Poll the watched dependency once and emit an event if the watched
    /// transition is seen.
    ///
    /// A failed or timed-out query is not an error: it is logged and the
    /// detector stays `Pending`.
    async fn tick(&mut self) -> Progress;
}
