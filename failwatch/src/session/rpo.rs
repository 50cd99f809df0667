use std::future::Future;
use std::time::Duration;

use anyerror::AnyError;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cluster::ControlPlane;
use crate::cluster::DataStore;
use crate::cluster::NodeId;
use crate::cluster::ReplicationLag;
use crate::cluster::ServiceProbe;
use crate::errors::MetricsError;
use crate::errors::SessionError;
use crate::event::EventKind;
use crate::observer::Observer;
use crate::session::rto::wait_milestone;
use crate::session::rto::wait_new_primary;
use crate::session::Anchor;
use crate::session::RpoRecord;
use crate::session::Timeouts;

/// One RPO test case.
#[derive(Debug, Clone)]
pub struct RpoScenario {
    pub test_case: String,
    pub failed_node: NodeId,

    /// Number of transactions written before the failure.
    pub transactions: u64,

    /// Pause between the last write and the failure.
    pub settle: Duration,

    /// `detection` is unused: RPO does not wait for `failure_detected`.
    pub timeouts: Timeouts,
}

/// Measures data loss of one failure injection.
///
/// Transactions are written and acknowledged, the failure is injected, and
/// once a new primary serves again the surviving transactions are counted.
pub struct RpoSession<CP, SP, DS>
where
    CP: ControlPlane,
    SP: ServiceProbe,
    DS: DataStore,
{
    run_id: String,
    observer: Observer<CP, SP>,
    store: DS,

    anchor: Option<Anchor>,
    record: Option<RpoRecord>,
}

impl<CP, SP, DS> RpoSession<CP, SP, DS>
where
    CP: ControlPlane,
    SP: ServiceProbe,
    DS: DataStore,
{
    pub fn new(
        run_id: impl ToString,
        observer: Observer<CP, SP>,
        store: DS,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            observer,
            store,
            anchor: None,
            record: None,
        }
    }

    pub fn observer(&self) -> &Observer<CP, SP> {
        &self.observer
    }

    pub fn store(&self) -> &DS {
        &self.store
    }

    pub async fn start_observation(&mut self) -> Result<(), SessionError> {
        self.observer.start().await?;
        tokio::time::sleep(self.observer.config().stabilization_delay()).await;
        Ok(())
    }

    pub async fn stop_observation(&mut self) {
        self.observer.stop().await;
    }

    /// Prepare the store for writing.
    pub async fn setup(&self) -> Result<(), SessionError> {
        self.store.create_table().await?;
        Ok(())
    }

    pub fn start_measurement(
        &mut self,
        test_case: impl ToString,
        failed_node: &NodeId,
    ) -> &RpoRecord {
        self.anchor = Some(Anchor::now());

        info!("start measurement {}: {}", self.run_id, failed_node);

        self.record.insert(RpoRecord {
            failed_node: Some(failed_node.clone()),
            ..RpoRecord::new(&self.run_id, test_case)
        })
    }

    fn started(&mut self) -> Result<(Anchor, &mut RpoRecord), SessionError> {
        match (self.anchor, self.record.as_mut()) {
            (Some(a), Some(r)) => Ok((a, r)),
            _ => Err(SessionError::NotStarted),
        }
    }

    /// Write one transaction and record it as the last acknowledged write.
    pub async fn write_transaction(
        &mut self,
        data: &str,
    ) -> Result<u64, SessionError> {
        self.started()?;

        let id = self.store.write(data).await?;
        let now = Instant::now();

        let (anchor, record) = self.started()?;
        record.last_transaction_id_written = Some(id);
        record.last_write_before_failure = Some(anchor.wall_at(now));

        debug!("written transaction {}", id);
        Ok(id)
    }

    pub async fn record_replication_lag(
        &mut self,
    ) -> Result<ReplicationLag, SessionError> {
        self.started()?;

        let lag = self.store.replication_lag().await?;

        let (_, record) = self.started()?;
        record.replication_lag_bytes = lag.bytes;
        record.replication_lag_seconds = lag.seconds;

        info!("replication lag: {:?}", lag);
        Ok(lag)
    }

    /// Mark the moment of failure injection. Call it right before injecting.
    pub fn mark_failure_occurred(&mut self) -> Result<(), SessionError> {
        let now = Instant::now();
        let (anchor, record) = self.started()?;
        record.failure_occurred_at = Some(anchor.wall_at(now));
        Ok(())
    }

    pub async fn wait_for_new_primary(
        &mut self,
        timeout: Duration,
        old_primary: Option<&NodeId>,
    ) -> Result<NodeId, SessionError> {
        let (anchor, _) = self.started()?;

        let ev =
            wait_new_primary(&self.observer, anchor.instant, timeout, old_primary)
                .await?;

        let node = ev
            .node_id()
            .cloned()
            .ok_or(SessionError::MissingNode(EventKind::NewPrimary))?;

        let (_, record) = self.started()?;
        record.new_primary_node = Some(node.clone());

        Ok(node)
    }

    /// Count the transactions that survived the failure.
    pub async fn verify_recovery(&mut self) -> Result<u64, SessionError> {
        let (anchor, record) = self.started()?;
        record.first_read_after_recovery = Some(anchor.wall_at(Instant::now()));

        let count = self.store.count().await?;

        let (_, record) = self.started()?;
        record.last_transaction_id_recovered = Some(count);

        info!(
            "recovered {} transactions, last written: {:?}",
            count, record.last_transaction_id_written
        );
        Ok(count)
    }

    /// Derive loss and RPO from what was recorded.
    pub fn finalize(&mut self) -> Result<Option<&RpoRecord>, MetricsError> {
        let Some(record) = self.record.as_mut() else {
            return Ok(None);
        };

        record.calculate_metrics()?;

        info!(
            "rpo {}: lost={:?} rpo_seconds={:?}",
            record.run_id, record.transactions_lost, record.rpo_seconds
        );
        Ok(Some(&*record))
    }

    pub fn record(&self) -> Option<&RpoRecord> {
        self.record.as_ref()
    }

    /// Observe, write, inject, wait for a serving new primary, count, stop.
    ///
    /// The observer is stopped and the record finalized whether or not the
    /// run succeeded. On error the partial record is available from
    /// [`record()`](Self::record). A metrics error never hides the run error.
    pub async fn run<F>(
        &mut self,
        scenario: RpoScenario,
        inject: F,
    ) -> Result<RpoRecord, SessionError>
    where
        F: Future<Output = Result<(), AnyError>>,
    {
        self.start_observation().await?;

        let res = self.measure(&scenario, inject).await;

        self.stop_observation().await;

        // Whatever was recorded is derived before an error is returned.
        let metrics = self.finalize().map(|_| ());

        if let Err(e) = &res {
            warn!("rpo run {} incomplete: {}", self.run_id, e);
        }
        res?;

        metrics?;
        self.record.clone().ok_or(SessionError::NotStarted)
    }

    async fn measure<F>(
        &mut self,
        scenario: &RpoScenario,
        inject: F,
    ) -> Result<(), SessionError>
    where
        F: Future<Output = Result<(), AnyError>>,
    {
        let t = scenario.timeouts;

        self.setup().await?;
        self.start_measurement(&scenario.test_case, &scenario.failed_node);

        for i in 0..scenario.transactions {
            self.write_transaction(&format!("txn-{}", i)).await?;
        }

        tokio::time::sleep(scenario.settle).await;
        self.record_replication_lag().await?;

        self.mark_failure_occurred()?;
        inject.await.map_err(SessionError::Injection)?;

        let (anchor, _) = self.started()?;

        self.wait_for_new_primary(t.election, Some(&scenario.failed_node))
            .await?;

        wait_milestone(
            &self.observer,
            EventKind::ServiceRestored,
            anchor.instant,
            t.restoration,
        )
        .await?;

        self.verify_recovery().await?;
        Ok(())
    }
}
