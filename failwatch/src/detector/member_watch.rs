use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::cluster::ControlPlane;
use crate::cluster::Member;
use crate::cluster::NodeId;
use crate::cluster::RUNNING;
use crate::detector::Detector;
use crate::detector::Progress;
use crate::errors::ControlPlaneError;
use crate::event::EventKind;
use crate::event::EventLog;
use crate::event::Subject;

/// What one poll saw of the watched member.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Unreachable(String),
    Member(Member),
}

impl Seen {
    fn state(&self) -> Option<&str> {
        match self {
            Seen::Unreachable(_) => None,
            Seen::Member(m) => Some(&m.state),
        }
    }
}

/// Watches the reachability of a single member.
///
/// Emits `node_unreachable` when the member drops out of the listing or
/// cannot be contacted, and `node_recovered` when it comes back `running`.
/// Runs for the whole observation; a member may go down and up repeatedly.
pub(crate) struct MemberWatch<CP>
where CP: ControlPlane
{
    control_plane: Arc<CP>,
    log: Arc<EventLog>,
    node: NodeId,
    query_timeout: Duration,
    prev: Option<Seen>,
}

impl<CP> MemberWatch<CP>
where CP: ControlPlane
{
    pub(crate) fn new(
        control_plane: Arc<CP>,
        log: Arc<EventLog>,
        node: NodeId,
        query_timeout: Duration,
    ) -> Self {
        Self {
            control_plane,
            log,
            node,
            query_timeout,
            prev: None,
        }
    }

    /// Returns `None` if the read is inconclusive.
    async fn observe(&self) -> Option<Seen> {
        let res = tokio::time::timeout(
            self.query_timeout,
            self.control_plane.member(&self.node),
        )
        .await;

        match res {
            Ok(Ok(Some(m))) => Some(Seen::Member(m)),
            Ok(Ok(None)) => Some(Seen::Unreachable("not listed".to_string())),
            Ok(Err(ControlPlaneError::MemberUnreachable { source, .. })) => {
                Some(Seen::Unreachable(source.to_string()))
            }
            Ok(Err(e)) => {
                debug!("inconclusive read of {}: {}", self.node, e);
                None
            }
            Err(_) => {
                debug!(
                    "read of {} timeout after {:?}",
                    self.node, self.query_timeout
                );
                None
            }
        }
    }
}

impl<CP> Detector for MemberWatch<CP>
where CP: ControlPlane
{
    fn name(&self) -> String {
        format!("member-{}", self.node)
    }

    async fn tick(&mut self) -> Progress {
        let Some(seen) = self.observe().await else {
            return Progress::Pending;
        };

        let prev = self.prev.replace(seen.clone());

        match (&prev, &seen) {
            (Some(Seen::Unreachable(_)), Seen::Unreachable(_)) => {}
            (_, Seen::Unreachable(reason)) => {
                self.log.append(
                    EventKind::NodeUnreachable,
                    Subject::Node(self.node.clone()),
                    Some(json!({"reason": reason})),
                );
            }
            (Some(p), Seen::Member(m)) => {
                if p.state() != Some(RUNNING) && m.state == RUNNING {
                    self.log.append(
                        EventKind::NodeRecovered,
                        Subject::Node(self.node.clone()),
                        Some(json!({
                            "old_state": p.state(),
                            "new_state": m.state,
                            "role": m.role,
                        })),
                    );
                }
            }
            (None, Seen::Member(m)) => {
                debug!("initial state of {}: {}", self.node, m);
            }
        }

        Progress::Pending
    }
}
