use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::cluster::ClusterSnapshot;
use crate::cluster::ClusterView;
use crate::cluster::ControlPlane;
use crate::cluster::NodeId;
use crate::cluster::ServiceProbe;
use crate::config::Config;
use crate::detector::DetectorLoop;
use crate::detector::ElectionDetector;
use crate::detector::FailureDetector;
use crate::detector::MemberWatch;
use crate::detector::RestorationDetector;
use crate::errors::ObserverError;
use crate::event::Event;
use crate::event::EventKind;
use crate::event::EventLog;
use crate::observer::observer_state::ObserverState;
use crate::observer::DetectionMode;
use crate::observer::Wait;
use crate::observer::WaitError;

/// Watches a cluster through a failure scenario and records what happens as
/// timestamped [`Event`]s.
///
/// `start()` captures the current leader as the baseline and spawns the
/// detector loops on the current tokio runtime. `stop()` signals them and
/// waits for them to exit, up to `shutdown_timeout`. The event log survives
/// `stop()` and is cleared by the next `start()`.
///
/// Dropping a running observer aborts its loops.
pub struct Observer<CP, SP>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    config: Arc<Config>,
    nodes: Vec<NodeId>,
    mode: DetectionMode,

    control_plane: Arc<CP>,
    probe: Arc<SP>,

    log: Arc<EventLog>,
    baseline: StdMutex<Option<NodeId>>,

    tx_snapshot: Arc<watch::Sender<ClusterSnapshot>>,
    rx_snapshot: watch::Receiver<ClusterSnapshot>,

    state: Mutex<ObserverState>,
}

impl<CP, SP> Observer<CP, SP>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    pub fn new(
        config: Arc<Config>,
        nodes: Vec<NodeId>,
        mode: DetectionMode,
        control_plane: CP,
        probe: SP,
    ) -> Self {
        let (tx_snapshot, rx_snapshot) =
            watch::channel(ClusterSnapshot::default());

        Self {
            config,
            nodes,
            mode,
            control_plane: Arc::new(control_plane),
            probe: Arc::new(probe),
            log: Arc::new(EventLog::new()),
            baseline: StdMutex::new(None),
            tx_snapshot: Arc::new(tx_snapshot),
            rx_snapshot,
            state: Mutex::new(ObserverState::Idle),
        }
    }

    /// Capture the baseline leader and spawn the detector loops.
    ///
    /// Does nothing if already running. Fails if stopped and not reset.
    #[tracing::instrument(level = "debug", skip_all, fields(mode = %self.mode))]
    pub async fn start(&self) -> Result<(), ObserverError> {
        let mut state = self.state.lock().await;

        match &*state {
            ObserverState::Running { .. } => {
                info!("observer already running");
                return Ok(());
            }
            ObserverState::Stopped => return Err(ObserverError::Stopped),
            ObserverState::Idle => {}
        }

        self.log.clear();
        self.tx_snapshot.send_replace(ClusterSnapshot::default());

        let baseline = self.query_baseline().await;
        info!("start observing {:?}, baseline leader: {:?}", self.nodes, baseline);
        *self.baseline.lock().unwrap() = baseline.clone();

        let (tx_shutdown, rx_shutdown) = watch::channel(false);
        let interval = self.config.poll_interval();
        let query_timeout = self.config.query_timeout();

        let mut handles = vec![];

        handles.push(DetectorLoop::spawn(
            FailureDetector::new(
                self.control_plane.clone(),
                self.log.clone(),
                self.nodes.clone(),
                query_timeout,
                self.tx_snapshot.clone(),
            ),
            interval,
            rx_shutdown.clone(),
        ));

        handles.push(DetectorLoop::spawn(
            ElectionDetector::new(
                self.control_plane.clone(),
                self.log.clone(),
                self.nodes.clone(),
                query_timeout,
                self.mode,
                baseline,
            ),
            interval,
            rx_shutdown.clone(),
        ));

        handles.push(DetectorLoop::spawn(
            RestorationDetector::new(
                self.probe.clone(),
                self.log.clone(),
                self.config.probe_timeout(),
            ),
            interval,
            rx_shutdown.clone(),
        ));

        if self.config.watch_members {
            for node in self.nodes.iter() {
                handles.push(DetectorLoop::spawn(
                    MemberWatch::new(
                        self.control_plane.clone(),
                        self.log.clone(),
                        node.clone(),
                        query_timeout,
                    ),
                    interval,
                    rx_shutdown.clone(),
                ));
            }
        }

        *state = ObserverState::Running {
            tx_shutdown,
            handles,
        };

        Ok(())
    }

    async fn query_baseline(&self) -> Option<NodeId> {
        let timeout = self.config.query_timeout();
        let res =
            tokio::time::timeout(timeout, self.control_plane.primary()).await;

        match res {
            Ok(Ok(leader)) => leader,
            Ok(Err(e)) => {
                warn!("failed to read baseline leader: {}", e);
                None
            }
            Err(_) => {
                warn!("read baseline leader timeout after {:?}", timeout);
                None
            }
        }
    }

    /// Signal all detector loops to exit and wait for them.
    ///
    /// Loops that do not exit within `shutdown_timeout` are aborted. Calling
    /// it when not running does nothing.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;

        if !state.is_running() {
            info!("observer is {}, nothing to stop", state.name());
            return;
        }

        let prev = std::mem::replace(&mut *state, ObserverState::Stopped);
        let ObserverState::Running {
            tx_shutdown,
            mut handles,
        } = prev
        else {
            unreachable!("checked running above");
        };

        tx_shutdown.send(true).ok();

        let timeout = self.config.shutdown_timeout();
        let join_all = futures::future::join_all(handles.iter_mut());

        match tokio::time::timeout(timeout, join_all).await {
            Ok(results) => {
                for res in results {
                    if let Err(e) = res {
                        if e.is_panic() {
                            error!("detector loop panicked: {}", e);
                        }
                    }
                }
            }
            Err(_) => {
                warn!(
                    "detector loops did not exit in {:?}, abort them",
                    timeout
                );
                for h in handles.iter() {
                    h.abort();
                }
            }
        }

        info!("observer stopped, {} events recorded", self.log.len());
    }

    /// Make a stopped observer startable again.
    ///
    /// The event log is cleared. Subscriptions made with
    /// [`on_event`](Self::on_event) are kept.
    pub async fn reset(&self) -> Result<(), ObserverError> {
        let mut state = self.state.lock().await;

        if state.is_running() {
            return Err(ObserverError::Running);
        }

        self.log.clear();
        *self.baseline.lock().unwrap() = None;
        *state = ObserverState::Idle;
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_running()
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn control_plane(&self) -> &Arc<CP> {
        &self.control_plane
    }

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// The leader captured by the last `start()`.
    ///
    /// `None` if it could not be read then. The election loop later takes
    /// its baseline from its first successful poll, which is not reflected
    /// here.
    pub fn baseline_primary(&self) -> Option<NodeId> {
        self.baseline.lock().unwrap().clone()
    }

    /// A copy of all recorded events in order.
    pub fn events(&self) -> Vec<Event> {
        self.log.events()
    }

    /// The first event of `kind`, optionally only those at or after `since`.
    pub fn get_event(
        &self,
        kind: EventKind,
        since: Option<Instant>,
    ) -> Option<Event> {
        self.log.first_since(kind, since)
    }

    /// Call `callback` for every future event of `kind`.
    pub fn on_event<F>(&self, kind: EventKind, callback: F)
    where F: Fn(&Event) + Send + Sync + 'static {
        self.log.subscribe(kind, callback)
    }

    /// The leader in the latest snapshot taken by the failure detector.
    pub fn get_current_primary(&self) -> Option<NodeId> {
        self.rx_snapshot.borrow().leader().cloned()
    }

    /// The latest full snapshot taken by the failure detector.
    pub fn cluster_snapshot(&self) -> ClusterSnapshot {
        self.rx_snapshot.borrow().clone()
    }

    /// Primary, replicas and unreachable members as of the latest snapshot.
    pub fn snapshot(&self) -> ClusterView {
        self.rx_snapshot.borrow().view(self.nodes.len())
    }

    /// Build a [`Wait`] on this observer's event log.
    ///
    /// `timeout` defaults to 30 seconds.
    pub fn wait(&self, timeout: Option<Duration>) -> Wait {
        Wait {
            timeout: timeout.unwrap_or_else(|| Duration::from_secs(30)),
            check_interval: self.config.wait_check_interval(),
            log: self.log.clone(),
        }
    }

    /// Wait for an event of `kind` appended at or after this call.
    ///
    /// `since` is taken when the call is made, not at the first check, so an
    /// event appended concurrently with the call is not missed. Use
    /// [`wait()`](Self::wait) to also match events already recorded.
    pub async fn wait_for_event(
        &self,
        kind: EventKind,
        timeout: Duration,
    ) -> Result<Event, WaitError> {
        let since = Instant::now();
        self.wait(Some(timeout))
            .kind_since(kind, Some(since), "wait_for_event")
            .await
    }
}

impl<CP, SP> Drop for Observer<CP, SP>
where
    CP: ControlPlane,
    SP: ServiceProbe,
{
    fn drop(&mut self) {
        if let ObserverState::Running {
            tx_shutdown,
            handles,
        } = self.state.get_mut()
        {
            tx_shutdown.send(true).ok();
            for h in handles.iter() {
                h.abort();
            }
        }
    }
}
