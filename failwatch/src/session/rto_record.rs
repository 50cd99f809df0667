use chrono::DateTime;
use chrono::Utc;

use crate::cluster::NodeId;
use crate::session::FailureType;
use crate::session::RtoDurations;

/// The outcome of one RTO measurement.
///
/// Missing values serialize as `null`; a record from a run that timed out is
/// still written.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct RtoRecord {
    pub run_id: String,
    pub test_case: String,
    pub failure_type: Option<FailureType>,
    pub failed_node: Option<NodeId>,

    pub failure_injected_at: Option<DateTime<Utc>>,
    pub failure_detected_at: Option<DateTime<Utc>>,
    pub new_primary_elected_at: Option<DateTime<Utc>>,
    pub service_restored_at: Option<DateTime<Utc>>,

    pub new_primary_node: Option<NodeId>,

    /// Seconds from injection to detection.
    pub detection_time: Option<f64>,

    /// Seconds from detection to election, or from injection for a
    /// switchover.
    pub election_time: Option<f64>,

    /// Seconds from election to the service accepting connections.
    pub restoration_time: Option<f64>,

    /// Seconds from injection to the service accepting connections.
    pub total_rto: Option<f64>,
}

impl RtoRecord {
    pub fn new(run_id: impl ToString, test_case: impl ToString) -> Self {
        Self {
            run_id: run_id.to_string(),
            test_case: test_case.to_string(),
            ..Default::default()
        }
    }

    pub fn apply(&mut self, d: RtoDurations) {
        self.detection_time = d.detection_time;
        self.election_time = d.election_time;
        self.restoration_time = d.restoration_time;
        self.total_rto = d.total_rto;
    }
}
