use std::sync::{Arc, Mutex};

use super::traits::{DeliveryFuture, TelemetrySink};
use crate::telemetry::TelemetryEvent;

/// Keeps every delivered event in memory for pull-style consumers.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Events delivered after the first `offset`, for incremental polling.
    pub fn events_since(&self, offset: usize) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .map(|guard| guard.iter().skip(offset).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver<'a>(&'a self, events: &'a [TelemetryEvent]) -> DeliveryFuture<'a> {
        Box::pin(async move {
            let mut guard = self.events.lock().map_err(|_| {
                crate::error::TelemetryError::SinkUnavailable {
                    sink: "memory".into(),
                    message: "buffer lock poisoned".into(),
                }
            })?;
            guard.extend_from_slice(events);
            Ok(())
        })
    }
}
