//! Error types exposed by this crate.

use std::error::Error;
use std::io;
use std::time::Duration;

use anyerror::AnyError;

use crate::cluster::NodeId;
use crate::event::EventKind;
use crate::observer::DetectionMode;
use crate::observer::WaitError;

/// Error returned by a [`ControlPlane`](crate::ControlPlane) query.
///
/// Detector loops treat every variant except [`MemberUnreachable`] as an
/// inconclusive read: they log it and retry on the next tick.
///
/// [`MemberUnreachable`]: ControlPlaneError::MemberUnreachable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlPlaneError {
    /// No member could answer the query.
    #[error("control plane unavailable: {0}")]
    Unavailable(AnyError),

    /// The specific member queried could not be reached.
    #[error("member {node} unreachable: {source}")]
    MemberUnreachable { node: NodeId, source: AnyError },

    /// The control plane answered with something that could not be parsed.
    #[error("invalid control plane response: {0}")]
    InvalidResponse(AnyError),

    #[error("control plane query timeout after {0:?}")]
    Timeout(Duration),
}

impl ControlPlaneError {
    pub fn unavailable<E: Error + 'static>(e: &E) -> Self {
        Self::Unavailable(AnyError::new(e))
    }

    pub fn invalid_response<E: Error + 'static>(e: &E) -> Self {
        Self::InvalidResponse(AnyError::new(e))
    }
}

/// Error returned by a [`DataStore`](crate::DataStore) operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("DataStoreError: {source}")]
pub struct DataStoreError {
    #[from]
    source: AnyError,
}

impl DataStoreError {
    pub fn new<E: Error + 'static>(e: &E) -> Self {
        Self {
            source: AnyError::new(e),
        }
    }

    pub fn from_string(msg: impl ToString) -> Self {
        Self {
            source: AnyError::error(msg),
        }
    }
}

/// Error returned by [`Observer`](crate::Observer) lifecycle calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserverError {
    /// `start()` was called on a stopped observer without `reset()`.
    #[error("observer is stopped, reset() it before starting again")]
    Stopped,

    /// `reset()` was called while detector loops are running.
    #[error("observer is running, stop() it before reset")]
    Running,
}

/// Error from deriving measurements out of recorded values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// More transactions were recovered than were written: the recorded
    /// values contradict each other.
    #[error("recovered transaction id {recovered} > last written {written}")]
    NegativeLoss { written: u64, recovered: u64 },
}

/// Error returned by a measurement session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A milestone event did not appear in time.
    #[error("no {milestone} within {timeout:?}: {source}")]
    Timeout {
        milestone: EventKind,
        timeout: Duration,
        source: WaitError,
    },

    #[error("measurement not started")]
    NotStarted,

    #[error("scenario needs {scenario} detection but observer runs in {observer} mode")]
    ModeMismatch {
        observer: DetectionMode,
        scenario: DetectionMode,
    },

    /// The caller supplied failure injection failed.
    #[error("failure injection failed: {0}")]
    Injection(AnyError),

    #[error("{0} event carries no node")]
    MissingNode(EventKind),

    #[error(transparent)]
    Observer(#[from] ObserverError),

    #[error(transparent)]
    DataStore(#[from] DataStoreError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Error writing or reading a JSONL result file.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error on {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("json error on {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}
