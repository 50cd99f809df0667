//! Helpers for building cluster fixtures in tests.

use crate::cluster::Member;
use crate::cluster::NodeId;
use crate::cluster::Role;
use crate::cluster::RUNNING;
#[cfg(any(test, feature = "testing"))]
use crate::event::Event;
#[cfg(any(test, feature = "testing"))]
use crate::event::EventKind;
#[cfg(any(test, feature = "testing"))]
use crate::event::EventLog;
#[cfg(any(test, feature = "testing"))]
use crate::event::Subject;

/// Build a [`NodeId`] from a string.
pub fn nid(id: impl ToString) -> NodeId {
    id.to_string()
}

/// Build a list of [`NodeId`]s.
pub fn nids<I, T>(ids: I) -> Vec<NodeId>
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    ids.into_iter().map(nid).collect()
}

/// A running leader member.
pub fn leader(id: impl ToString) -> Member {
    Member::new(id, Role::Leader, RUNNING)
}

/// A streaming replica member.
pub fn replica(id: impl ToString) -> Member {
    Member::new(id, Role::Replica, "streaming")
}

/// Record an event as if a detector loop had observed it.
///
/// Available with the `testing` feature.
#[cfg(any(test, feature = "testing"))]
pub fn append_event(
    log: &EventLog,
    kind: EventKind,
    node: Subject,
    payload: Option<serde_json::Value>,
) -> Event {
    log.append(kind, node, payload)
}
