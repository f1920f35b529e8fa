use std::future::Future;
use std::pin::Pin;

use crate::error::TelemetryError;
use crate::telemetry::TelemetryEvent;

pub type DeliveryFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TelemetryError>> + Send + 'a>>;

/// Transport for delivered telemetry. Implement for any backend.
///
/// A batch must be applied as a whole or not at all: the reporter retries a
/// failed or timed-out batch, and a partially applied one would show up
/// twice.
pub trait TelemetrySink: Send + Sync {
    /// Human-readable name of this sink
    fn name(&self) -> &str;

    /// Deliver one cycle's events, in order.
    fn deliver<'a>(&'a self, events: &'a [TelemetryEvent]) -> DeliveryFuture<'a>;
}
