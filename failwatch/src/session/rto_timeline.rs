use tokio::time::Instant;

/// The monotonic instants of one RTO measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtoTimeline {
    pub injected: Option<Instant>,
    pub detected: Option<Instant>,
    pub elected: Option<Instant>,
    pub restored: Option<Instant>,

    /// A planned switchover has no detection phase; election is measured
    /// from injection instead.
    pub switchover: bool,
}

/// Durations derived from an [`RtoTimeline`], in seconds.
///
/// A duration is `None` if any instant it depends on is missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RtoDurations {
    pub detection_time: Option<f64>,
    pub election_time: Option<f64>,
    pub restoration_time: Option<f64>,
    pub total_rto: Option<f64>,
}

impl RtoTimeline {
    pub fn durations(&self) -> RtoDurations {
        let election_start = if self.switchover {
            self.injected
        } else {
            self.detected
        };

        RtoDurations {
            detection_time: secs_between(self.injected, self.detected),
            election_time: secs_between(election_start, self.elected),
            restoration_time: secs_between(self.elected, self.restored),
            total_rto: secs_between(self.injected, self.restored),
        }
    }
}

fn secs_between(from: Option<Instant>, to: Option<Instant>) -> Option<f64> {
    let (from, to) = (from?, to?);
    Some(to.saturating_duration_since(from).as_secs_f64())
}
