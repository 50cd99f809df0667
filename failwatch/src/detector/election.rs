use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cluster::ClusterSnapshot;
use crate::cluster::ControlPlane;
use crate::cluster::NodeId;
use crate::detector::Detector;
use crate::detector::Progress;
use crate::event::EventKind;
use crate::event::EventLog;
use crate::event::Subject;
use crate::observer::DetectionMode;

/// Detects a leader other than the one captured when observation started.
///
/// In failover mode it stays idle until `failure_detected` is in the log. In
/// switchover mode there is no failure to wait for and it is armed at once.
///
/// If the leader could not be read at start, the first leader seen by a
/// successful poll becomes the baseline and is never reported. The exception
/// is an armed failover detector: a failure has been observed, so any leader
/// that shows up afterwards is a new one.
pub(crate) struct ElectionDetector<CP>
where CP: ControlPlane
{
    control_plane: Arc<CP>,
    log: Arc<EventLog>,
    nodes: Vec<NodeId>,
    query_timeout: Duration,
    mode: DetectionMode,
    baseline: Option<NodeId>,
    armed: bool,
}

impl<CP> ElectionDetector<CP>
where CP: ControlPlane
{
    pub(crate) fn new(
        control_plane: Arc<CP>,
        log: Arc<EventLog>,
        nodes: Vec<NodeId>,
        query_timeout: Duration,
        mode: DetectionMode,
        baseline: Option<NodeId>,
    ) -> Self {
        Self {
            control_plane,
            log,
            nodes,
            query_timeout,
            mode,
            baseline,
            armed: false,
        }
    }

    fn try_arm(&mut self) -> bool {
        if self.armed {
            return true;
        }

        self.armed = match self.mode {
            DetectionMode::Switchover => true,
            DetectionMode::Failover => {
                self.log.contains(EventKind::FailureDetected)
            }
        };

        if self.armed {
            debug!("armed, baseline leader: {:?}", self.baseline);
        }
        self.armed
    }
}

impl<CP> Detector for ElectionDetector<CP>
where CP: ControlPlane
{
    fn name(&self) -> String {
        "election".to_string()
    }

    async fn tick(&mut self) -> Progress {
        let armed = self.try_arm();

        let adopt_baseline = self.baseline.is_none()
            && (!armed || self.mode == DetectionMode::Switchover);

        if !armed && !adopt_baseline {
            return Progress::Pending;
        }

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

        let leaders = snapshot.leaders();

        if adopt_baseline {
            if let Some(leader) = snapshot.leader() {
                info!("baseline leader adopted: {}", leader);
                self.baseline = Some(leader.clone());
            }
            return Progress::Pending;
        }

        // With two leaders visible, the stale one may be the baseline.
        let new_leader =
            leaders.iter().find(|id| Some(**id) != self.baseline.as_ref());

        let Some(new_leader) = new_leader else {
            debug!("no new leader yet, leaders: {:?}", leaders);
            return Progress::Pending;
        };

        let mut payload = json!({
            "old_primary": self.baseline,
            "new_primary": new_leader,
        });

        if leaders.len() > 1 {
            warn!("split brain, leaders: {:?}", leaders);
            payload["split_brain"] = json!(leaders);
        }

        info!("new leader elected: {}", new_leader);

        self.log.append(
            EventKind::NewPrimary,
            Subject::Node((*new_leader).clone()),
            Some(payload),
        );

        Progress::Done
    }
}
