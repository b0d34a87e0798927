//! Records store events so tests can assert on notifications.

use std::sync::{Arc, Mutex, PoisonError};
use voteroll_store::StoreEvent;

/// Collects every event delivered to its listener.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<StoreEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener to hand to a store's `subscribe`.
    pub fn listener(&self) -> Box<dyn Fn(&StoreEvent) + Send + Sync> {
        let events = Arc::clone(&self.events);
        Box::new(move |event| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        })
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, pred: impl Fn(&StoreEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| pred(e))
            .count()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
