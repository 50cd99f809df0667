use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tracing::debug;
use tracing::warn;

use crate::cluster::ClusterSnapshot;
use crate::cluster::ControlPlane;
use crate::cluster::NodeId;
use crate::detector::Detector;
use crate::detector::Progress;
use crate::event::EventKind;
use crate::event::EventLog;
use crate::event::Subject;

/// Detects the loss of leader consensus: every member that reports is a
/// non-leader.
///
/// It keeps polling after emitting `failure_detected`, because the snapshot it
/// publishes backs [`Observer::snapshot()`](crate::Observer::snapshot). It
/// never emits a second time.
pub(crate) struct FailureDetector<CP>
where CP: ControlPlane
{
    control_plane: Arc<CP>,
    log: Arc<EventLog>,
    nodes: Vec<NodeId>,
    query_timeout: Duration,
    tx_snapshot: Arc<watch::Sender<ClusterSnapshot>>,
    prev: Option<ClusterSnapshot>,
    emitted: bool,
}

impl<CP> FailureDetector<CP>
where CP: ControlPlane
{
    pub(crate) fn new(
        control_plane: Arc<CP>,
        log: Arc<EventLog>,
        nodes: Vec<NodeId>,
        query_timeout: Duration,
        tx_snapshot: Arc<watch::Sender<ClusterSnapshot>>,
    ) -> Self {
        Self {
            control_plane,
            log,
            nodes,
            query_timeout,
            tx_snapshot,
            prev: None,
            emitted: false,
        }
    }
}

impl<CP> Detector for FailureDetector<CP>
where CP: ControlPlane
{
    fn name(&self) -> String {
        "failure".to_string()
    }

    async fn tick(&mut self) -> Progress {
        let res = ClusterSnapshot::query(
            self.control_plane.as_ref(),
            &self.nodes,
            self.query_timeout,
        )
        .await;

        let snapshot = match res {
            Ok(x) => x,
            Err(e) => {
                warn!("inconclusive cluster read: {}", e);
                return Progress::Pending;
            }
        };

        if let Some(prev) = &self.prev {
            for (id, before, now) in snapshot.changed_since(prev) {
                debug!(
                    "member {}: {} -> {}",
                    id,
                    before.map(|x| x.to_string()).unwrap_or_default(),
                    now
                );
            }
        }

        if snapshot.is_split_brain() {
            warn!("more than one leader: {:?}", snapshot.leaders());
        }

        let leaderless = snapshot.is_leaderless();

        if leaderless && !self.emitted {
            let members: Vec<_> = snapshot
                .reachable()
                .map(|(id, s)| json!({"member": id, "role": s.role, "state": s.health}))
                .collect();

            self.log.append(
                EventKind::FailureDetected,
                Subject::Cluster,
                Some(json!({
                    "reason": "no_leader",
                    "members": members,
                })),
            );
            self.emitted = true;
        }

        self.tx_snapshot.send_replace(snapshot.clone());
        self.prev = Some(snapshot);

        Progress::Pending
    }
}
