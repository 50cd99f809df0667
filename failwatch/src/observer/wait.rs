use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cluster::NodeId;
use crate::event::Event;
use crate::event::EventKind;
use crate::event::EventLog;

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout after {0:?} when {1}")]
    Timeout(Duration, String),
}

/// Wait polls an [`EventLog`] until an event satisfying some condition shows
/// up, or the timeout expires.
///
/// The log is checked once more after the last sleep, so an event appended
/// right before the deadline is still found.
pub struct Wait {
    pub timeout: Duration,
    pub check_interval: Duration,
    pub log: Arc<EventLog>,
}

impl Wait {
    /// Wait for the first event stamped at or after `since` that satisfies
    /// `func`.
    #[tracing::instrument(level = "trace", skip(self, func), fields(msg=%msg.to_string()))]
    pub async fn event<T>(
        &self,
        since: Option<Instant>,
        func: T,
        msg: impl ToString,
    ) -> Result<Event, WaitError>
    where
        T: Fn(&Event) -> bool + Send,
    {
        let timeout_at = Instant::now() + self.timeout;

        loop {
            let found = self.log.find(|e| {
                since.map_or(true, |s| e.timestamp >= s) && func(e)
            });

            if let Some(event) = found {
                tracing::debug!("done wait {}: {}", msg.to_string(), event);
                return Ok(event);
            }

            let now = Instant::now();
            if now >= timeout_at {
                return Err(WaitError::Timeout(
                    self.timeout,
                    format!(
                        "{}, {} events in log",
                        msg.to_string(),
                        self.log.len()
                    ),
                ));
            }

            let sleep_time = (timeout_at - now).min(self.check_interval);
            tokio::time::sleep(sleep_time).await;
        }
    }

    /// Wait for an event of `kind`.
    #[tracing::instrument(level = "trace", skip(self), fields(msg=msg.to_string().as_str()))]
    pub async fn kind(
        &self,
        kind: EventKind,
        msg: impl ToString,
    ) -> Result<Event, WaitError> {
        self.kind_since(kind, None, msg).await
    }

    /// Wait for an event of `kind` stamped at or after `since`.
    #[tracing::instrument(level = "trace", skip(self), fields(msg=msg.to_string().as_str()))]
    pub async fn kind_since(
        &self,
        kind: EventKind,
        since: Option<Instant>,
        msg: impl ToString,
    ) -> Result<Event, WaitError> {
        self.event(
            since,
            |e| e.kind == kind,
            &format!("{} .kind == {}", msg.to_string(), kind),
        )
        .await
    }

    /// Wait for `new_primary` naming a node other than `old`.
    #[tracing::instrument(level = "trace", skip(self), fields(msg=msg.to_string().as_str()))]
    pub async fn new_primary_other_than(
        &self,
        old: &NodeId,
        since: Option<Instant>,
        msg: impl ToString,
    ) -> Result<Event, WaitError> {
        self.event(
            since,
            |e| e.kind == EventKind::NewPrimary && e.node_id() != Some(old),
            &format!("{} .new_primary != {}", msg.to_string(), old),
        )
        .await
    }
}
