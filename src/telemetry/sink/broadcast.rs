use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use super::traits::{DeliveryFuture, TelemetrySink};
use crate::telemetry::TelemetryEvent;

/// Fans delivered events out to read-only subscribers.
///
/// Subscribers receive copies; there is no path from a subscriber back into
/// the cycle loop. A slow subscriber lags and skips events instead of
/// holding up delivery.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<TelemetryEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> impl Stream<Item = TelemetryEvent> + Send + Unpin + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(error) => {
                tracing::warn!(%error, "telemetry subscriber lagged");
                None
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl TelemetrySink for BroadcastSink {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn deliver<'a>(&'a self, events: &'a [TelemetryEvent]) -> DeliveryFuture<'a> {
        Box::pin(async move {
            for event in events {
                // No subscribers is not a delivery failure.
                let _ = self.tx.send(event.clone());
            }
            Ok(())
        })
    }
}
