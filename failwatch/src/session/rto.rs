use std::future::Future;
use std::time::Duration;

use anyerror::AnyError;
use tokio::time::Instant;
use tracing::info;
use tracing::warn;

use crate::cluster::ClusterView;
use crate::cluster::ControlPlane;
use crate::cluster::NodeId;
use crate::cluster::ServiceProbe;
use crate::errors::SessionError;
use crate::event::Event;
use crate::event::EventKind;
use crate::observer::Observer;
use crate::session::events_summary;
use crate::session::Anchor;
use crate::session::FailureType;
use crate::session::RtoRecord;
use crate::session::RtoTimeline;

/// How long to wait for each milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub detection: Duration,
    pub election: Duration,
    pub restoration: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            detection: Duration::from_secs(30),
            election: Duration::from_secs(60),
            restoration: Duration::from_secs(30),
        }
    }
}

/// One RTO test case.
#[derive(Debug, Clone)]
pub struct RtoScenario {
    pub test_case: String,

    /// The current primary, which the failure is injected into.
    pub failed_node: NodeId,
    pub failure_type: FailureType,
    pub timeouts: Timeouts,
}

/// Measures recovery time of one failure injection.
///
/// The steps are usually driven by [`run()`](Self::run). They are public so
/// that a caller can drive the injection and the waits itself:
///
/// ```ignore
/// session.start_observation().await?;
/// session.start_measurement("stop_primary", &primary, FailureType::Stop);
/// docker.stop(&primary).await?;
/// session.wait_for_failure_detection(Duration::from_secs(30)).await?;
/// session.wait_for_new_primary(Duration::from_secs(60), Some(&primary)).await?;
/// session.wait_for_service_restored(Duration::from_secs(30)).await?;
/// session.stop_observation().await;
/// let record = session.finalize();
/// ```
pub struct RtoSession<CP, SP>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    run_id: String,
    observer: Observer<CP, SP>,

    anchor: Option<Anchor>,
    timeline: RtoTimeline,
    record: Option<RtoRecord>,
}

impl<CP, SP> RtoSession<CP, SP>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    pub fn new(run_id: impl ToString, observer: Observer<CP, SP>) -> Self {
        Self {
            run_id: run_id.to_string(),
            observer,
            anchor: None,
            timeline: RtoTimeline::default(),
            record: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn observer(&self) -> &Observer<CP, SP> {
        &self.observer
    }

    /// Start the observer and let it settle.
    pub async fn start_observation(&mut self) -> Result<(), SessionError> {
        self.observer.start().await?;
        tokio::time::sleep(self.observer.config().stabilization_delay()).await;
        Ok(())
    }

    pub async fn stop_observation(&mut self) {
        self.observer.stop().await;
    }

    /// Mark the moment of failure injection. Call it right before injecting.
    pub fn start_measurement(
        &mut self,
        test_case: impl ToString,
        failed_node: &NodeId,
        failure_type: FailureType,
    ) -> &RtoRecord {
        let anchor = Anchor::now();

        self.anchor = Some(anchor);
        self.timeline = RtoTimeline {
            injected: Some(anchor.instant),
            switchover: failure_type == FailureType::Switchover,
            ..Default::default()
        };

        info!(
            "start measurement {}: {} {}",
            self.run_id, failure_type, failed_node
        );

        self.record.insert(RtoRecord {
            failure_type: Some(failure_type),
            failed_node: Some(failed_node.clone()),
            failure_injected_at: Some(anchor.wall),
            ..RtoRecord::new(&self.run_id, test_case)
        })
    }

    fn started(&mut self) -> Result<(Anchor, &mut RtoRecord), SessionError> {
        match (self.anchor, self.record.as_mut()) {
            (Some(a), Some(r)) => Ok((a, r)),
            _ => Err(SessionError::NotStarted),
        }
    }

    pub async fn wait_for_failure_detection(
        &mut self,
        timeout: Duration,
    ) -> Result<Event, SessionError> {
        let (anchor, _) = self.started()?;

        let ev = wait_milestone(
            &self.observer,
            EventKind::FailureDetected,
            anchor.instant,
            timeout,
        )
        .await?;

        self.timeline.detected = Some(ev.timestamp);

        let (anchor, record) = self.started()?;
        record.failure_detected_at = Some(anchor.wall_at(ev.timestamp));

        info!(
            "failure detected after {:?}",
            ev.elapsed_since(anchor.instant)
        );
        Ok(ev)
    }

    /// Wait for a new primary and return its id.
    ///
    /// If the first `new_primary` names `old_primary`, keep waiting for one
    /// that does not, within what is left of `timeout`.
    pub async fn wait_for_new_primary(
        &mut self,
        timeout: Duration,
        old_primary: Option<&NodeId>,
    ) -> Result<NodeId, SessionError> {
        let (anchor, _) = self.started()?;

        let ev = wait_new_primary(
            &self.observer,
            anchor.instant,
            timeout,
            old_primary,
        )
        .await?;

        let node = ev
            .node_id()
            .cloned()
            .ok_or(SessionError::MissingNode(EventKind::NewPrimary))?;

        self.timeline.elected = Some(ev.timestamp);

        let (anchor, record) = self.started()?;
        record.new_primary_elected_at = Some(anchor.wall_at(ev.timestamp));
        record.new_primary_node = Some(node.clone());

        info!(
            "new primary {} after {:?}",
            node,
            ev.elapsed_since(anchor.instant)
        );
        Ok(node)
    }

    pub async fn wait_for_service_restored(
        &mut self,
        timeout: Duration,
    ) -> Result<Event, SessionError> {
        let (anchor, _) = self.started()?;

        let ev = wait_milestone(
            &self.observer,
            EventKind::ServiceRestored,
            anchor.instant,
            timeout,
        )
        .await?;

        self.timeline.restored = Some(ev.timestamp);

        let (anchor, record) = self.started()?;
        record.service_restored_at = Some(anchor.wall_at(ev.timestamp));

        info!(
            "service restored after {:?}",
            ev.elapsed_since(anchor.instant)
        );
        Ok(ev)
    }

    /// Compute the durations from whatever milestones were reached.
    pub fn finalize(&mut self) -> Option<&RtoRecord> {
        let durations = self.timeline.durations();
        let record = self.record.as_mut()?;
        record.apply(durations);

        info!(
            "rto {}: detection={:?} election={:?} restoration={:?} total={:?}",
            record.run_id,
            record.detection_time,
            record.election_time,
            record.restoration_time,
            record.total_rto
        );
        Some(&*record)
    }

    /// The record of the current measurement, possibly partial.
    pub fn record(&self) -> Option<&RtoRecord> {
        self.record.as_ref()
    }

    pub fn timeline(&self) -> &RtoTimeline {
        &self.timeline
    }

    pub fn cluster_view(&self) -> ClusterView {
        self.observer.snapshot()
    }

    pub fn events_summary(&self) -> String {
        events_summary(&self.observer.events(), self.timeline.injected)
    }

    /// Observe, inject, wait for every milestone, stop.
    ///
    /// The observer is stopped and the record finalized whether or not all
    /// milestones were reached. On error the partial record is available
    /// from [`record()`](Self::record).
    pub async fn run<F>(
        &mut self,
        scenario: RtoScenario,
        inject: F,
    ) -> Result<RtoRecord, SessionError>
    where
        F: Future<Output = Result<(), AnyError>>,
    {
        let want = scenario.failure_type.detection_mode();
        if want != self.observer.mode() {
            return Err(SessionError::ModeMismatch {
                observer: self.observer.mode(),
                scenario: want,
            });
        }

        self.start_observation().await?;

        let res = self.measure(&scenario, inject).await;

        self.stop_observation().await;
        self.finalize();

        if let Err(e) = &res {
            warn!("rto run {} incomplete: {}", self.run_id, e);
        }
        res?;

        self.record.clone().ok_or(SessionError::NotStarted)
    }

    async fn measure<F>(
        &mut self,
        scenario: &RtoScenario,
        inject: F,
    ) -> Result<(), SessionError>
    where
        F: Future<Output = Result<(), AnyError>>,
    {
        let t = scenario.timeouts;

        self.start_measurement(
            &scenario.test_case,
            &scenario.failed_node,
            scenario.failure_type,
        );

        inject.await.map_err(SessionError::Injection)?;

        if scenario.failure_type != FailureType::Switchover {
            self.wait_for_failure_detection(t.detection).await?;
        }

        self.wait_for_new_primary(t.election, Some(&scenario.failed_node))
            .await?;
        self.wait_for_service_restored(t.restoration).await?;

        Ok(())
    }
}

pub(crate) async fn wait_milestone<CP, SP>(
    observer: &Observer<CP, SP>,
    kind: EventKind,
    since: Instant,
    timeout: Duration,
) -> Result<Event, SessionError>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    observer
        .wait(Some(timeout))
        .kind_since(kind, Some(since), "milestone")
        .await
        .map_err(|source| SessionError::Timeout {
            milestone: kind,
            timeout,
            source,
        })
}

pub(crate) async fn wait_new_primary<CP, SP>(
    observer: &Observer<CP, SP>,
    since: Instant,
    timeout: Duration,
    old_primary: Option<&NodeId>,
) -> Result<Event, SessionError>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    let begin = Instant::now();
    let ev =
        wait_milestone(observer, EventKind::NewPrimary, since, timeout).await?;

    let Some(old) = old_primary else {
        return Ok(ev);
    };

    if ev.node_id() != Some(old) {
        return Ok(ev);
    }

    warn!("new_primary names the old primary {}, keep waiting", old);

    let remaining = timeout.saturating_sub(begin.elapsed());

    observer
        .wait(Some(remaining))
        .new_primary_other_than(old, Some(since), "different primary")
        .await
        .map_err(|source| SessionError::Timeout {
            milestone: EventKind::NewPrimary,
            timeout,
            source,
        })
}
