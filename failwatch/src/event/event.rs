use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::cluster::NodeId;
use crate::event::EventKind;
use crate::event::Subject;

/// A detected state transition.
///
/// `timestamp` is monotonic and is assigned when the event is appended to the
/// [`EventLog`](crate::EventLog), never by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub node: Subject,
    pub timestamp: Instant,
    pub payload: Option<serde_json::Value>,
}

impl Event {
    pub(crate) fn new(
        kind: EventKind,
        node: Subject,
        timestamp: Instant,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            kind,
            node,
            timestamp,
            payload,
        }
    }

    pub fn node_id(&self) -> Option<&NodeId> {
        self.node.node_id()
    }

    /// Time from `earlier` to this event, zero if `earlier` is later.
    pub fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.timestamp.saturating_duration_since(earlier)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.node)?;
        if let Some(p) = &self.payload {
            write!(f, " {}", p)?;
        }
        Ok(())
    }
}
