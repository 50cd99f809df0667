use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;

use tokio::time::Instant;
use tracing::error;
use tracing::info;

use crate::event::Event;
use crate::event::EventKind;
use crate::event::Subject;

type Callback = Arc<dyn Fn(&Event) + Send + Sync + 'static>;

/// Append-only, totally ordered record of detected events.
///
/// Appending assigns the timestamp while holding the lock, so the order of
/// entries and the order of their timestamps always agree.
///
/// Callbacks registered with [`subscribe`](Self::subscribe) are called after
/// the event is appended and outside the lock. A panicking callback is logged
/// and does not affect the log or other callbacks.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
    callbacks: Mutex<Vec<(EventKind, Callback)>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and append an event, then notify subscribers of its kind.
    ///
    /// Only detector loops record events.
    pub(crate) fn append(
        &self,
        kind: EventKind,
        node: Subject,
        payload: Option<serde_json::Value>,
    ) -> Event {
        let event = {
            let mut events = self.events.lock().unwrap();
            let event = Event::new(kind, node, Instant::now(), payload);
            events.push(event.clone());
            event
        };

        info!("event: {}", event);

        self.notify(&event);
        event
    }

    /// Register `callback` to be called for every future event of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where F: Fn(&Event) + Send + Sync + 'static {
        let mut callbacks = self.callbacks.lock().unwrap();
        callbacks.push((kind, Arc::new(callback)));
    }

    fn notify(&self, event: &Event) {
        let to_call: Vec<Callback> = {
            let callbacks = self.callbacks.lock().unwrap();
            callbacks
                .iter()
                .filter(|(k, _)| *k == event.kind)
                .map(|(_, cb)| cb.clone())
                .collect()
        };

        for cb in to_call {
            let res = catch_unwind(AssertUnwindSafe(|| cb(event)));
            if res.is_err() {
                error!("event callback panicked, event: {}", event);
            }
        }
    }

    /// The first event satisfying `func`.
    pub fn find<F>(&self, func: F) -> Option<Event>
    where F: Fn(&Event) -> bool {
        let events = self.events.lock().unwrap();
        events.iter().find(|e| func(e)).cloned()
    }

    /// The first event of `kind` stamped at or after `since`.
    pub fn first_since(
        &self,
        kind: EventKind,
        since: Option<Instant>,
    ) -> Option<Event> {
        self.find(|e| {
            e.kind == kind && since.map_or(true, |s| e.timestamp >= s)
        })
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.first_since(kind, None).is_some()
    }

    /// Number of events of `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        let events = self.events.lock().unwrap();
        events.iter().filter(|e| e.kind == kind).count()
    }

    /// A copy of all events in append order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all events. Subscriptions are kept.
    pub(crate) fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}
