use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::cluster::ServiceProbe;
use crate::detector::Detector;
use crate::detector::Progress;
use crate::event::EventKind;
use crate::event::EventLog;
use crate::event::Subject;

/// Detects the service accepting connections again, once a new primary has
/// been elected.
pub(crate) struct RestorationDetector<SP>
where SP: ServiceProbe
{
    probe: Arc<SP>,
    log: Arc<EventLog>,
    probe_timeout: Duration,
    armed: bool,
}

impl<SP> RestorationDetector<SP>
where SP: ServiceProbe
{
    pub(crate) fn new(
        probe: Arc<SP>,
        log: Arc<EventLog>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            probe,
            log,
            probe_timeout,
            armed: false,
        }
    }
}

impl<SP> Detector for RestorationDetector<SP>
where SP: ServiceProbe
{
    fn name(&self) -> String {
        "restoration".to_string()
    }

    async fn tick(&mut self) -> Progress {
        if !self.armed {
            self.armed = self.log.contains(EventKind::NewPrimary);
            if !self.armed {
                return Progress::Pending;
            }
            debug!("armed, probing {}", self.probe.endpoint());
        }

        let res =
            tokio::time::timeout(self.probe_timeout, self.probe.is_available())
                .await;

        let available = match res {
            Ok(x) => x,
            Err(_) => {
                debug!("probe timeout after {:?}", self.probe_timeout);
                false
            }
        };

        if !available {
            return Progress::Pending;
        }

        self.log.append(
            EventKind::ServiceRestored,
            Subject::Cluster,
            Some(json!({"endpoint": self.probe.endpoint()})),
        );

        Progress::Done
    }
}
