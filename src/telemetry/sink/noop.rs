use super::traits::{DeliveryFuture, TelemetrySink};
use crate::telemetry::TelemetryEvent;

/// Discards every batch.
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn name(&self) -> &str {
        "noop"
    }

    fn deliver<'a>(&'a self, _events: &'a [TelemetryEvent]) -> DeliveryFuture<'a> {
        Box::pin(async { Ok(()) })
    }
}
