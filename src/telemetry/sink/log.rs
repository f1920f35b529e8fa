use super::traits::{DeliveryFuture, TelemetrySink};
use crate::telemetry::TelemetryEvent;
use tracing::info;

/// Renders delivered events through tracing.
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetrySink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver<'a>(&'a self, events: &'a [TelemetryEvent]) -> DeliveryFuture<'a> {
        Box::pin(async move {
            for event in events {
                info!(
                    cycle_id = event.cycle_id,
                    sequence = event.sequence,
                    delivery = %event.delivery,
                    payload = %event.payload,
                    "telemetry.{}",
                    event.kind
                );
            }
            Ok(())
        })
    }
}
