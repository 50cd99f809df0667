use chrono::DateTime;
use chrono::Utc;
use tracing::error;

use crate::cluster::NodeId;
use crate::errors::MetricsError;

/// The outcome of one RPO measurement.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct RpoRecord {
    pub run_id: String,
    pub test_case: String,
    pub failed_node: Option<NodeId>,
    pub new_primary_node: Option<NodeId>,

    pub last_write_before_failure: Option<DateTime<Utc>>,
    pub failure_occurred_at: Option<DateTime<Utc>>,
    pub first_read_after_recovery: Option<DateTime<Utc>>,

    pub last_transaction_id_written: Option<u64>,
    pub last_transaction_id_recovered: Option<u64>,

    pub transactions_lost: Option<u64>,
    pub data_loss_occurred: bool,

    /// Seconds between the last acknowledged write and the failure: the
    /// window of writes at risk.
    pub rpo_seconds: Option<f64>,

    pub replication_lag_bytes: Option<u64>,
    pub replication_lag_seconds: Option<f64>,
}

impl RpoRecord {
    pub fn new(run_id: impl ToString, test_case: impl ToString) -> Self {
        Self {
            run_id: run_id.to_string(),
            test_case: test_case.to_string(),
            ..Default::default()
        }
    }

    /// Derive loss and RPO from the recorded values.
    ///
    /// If more transactions were recovered than written, the loss fields are
    /// left unset and an error is returned.
    pub fn calculate_metrics(&mut self) -> Result<(), MetricsError> {
        if let (Some(a), Some(b)) =
            (self.last_write_before_failure, self.failure_occurred_at)
        {
            let d = b - a;
            self.rpo_seconds = d.to_std().ok().map(|d| d.as_secs_f64());
        }

        let (Some(written), Some(recovered)) = (
            self.last_transaction_id_written,
            self.last_transaction_id_recovered,
        ) else {
            return Ok(());
        };

        if recovered > written {
            let err = MetricsError::NegativeLoss { written, recovered };
            error!("inconsistent rpo record {}: {}", self.run_id, err);
            return Err(err);
        }

        self.transactions_lost = Some(written - recovered);
        self.data_loss_occurred = written > recovered;
        Ok(())
    }
}
