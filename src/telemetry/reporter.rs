use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::event::{CycleEvents, Delivery, TelemetryEvent};
use super::sink::TelemetrySink;
use crate::config::TelemetryConfig;
use crate::error::TelemetryError;

/// One cycle's events, in emission order.
#[derive(Debug, Clone)]
pub struct TelemetryBatch {
    pub cycle_id: u64,
    pub events: Vec<TelemetryEvent>,
}

#[derive(Debug, Default)]
struct TelemetryCounters {
    queued: AtomicU64,
    delivered: AtomicU64,
    delayed: AtomicU64,
    dropped: AtomicU64,
    sink_failures: AtomicU64,
}

impl TelemetryCounters {
    fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(u64::try_from(n).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    fn snapshot(&self) -> TelemetryStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        TelemetryStats {
            queued: load(&self.queued),
            delivered: load(&self.delivered),
            delayed: load(&self.delayed),
            dropped: load(&self.dropped),
            sink_failures: load(&self.sink_failures),
        }
    }
}

/// Point-in-time view of delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    /// Events accepted onto the reporter channel.
    pub queued: u64,
    /// Events the sink accepted, including `telemetry_delayed` notices.
    pub delivered: u64,
    /// Events that reached the sink only after a failed attempt.
    pub delayed: u64,
    /// Events given up on: channel full, backlog overflow, or shutdown.
    pub dropped: u64,
    pub sink_failures: u64,
}

/// Producer side of the telemetry pipeline.
///
/// [`TelemetryReporter::report`] never waits: the batch goes onto a bounded
/// channel or is marked dropped. Delivery happens on a separate task, so a
/// slow or dead sink cannot hold up the next cycle.
#[derive(Debug, Clone)]
pub struct TelemetryReporter {
    tx: mpsc::Sender<TelemetryBatch>,
    counters: Arc<TelemetryCounters>,
}

impl TelemetryReporter {
    /// Start the delivery worker. Must be called inside a tokio runtime.
    ///
    /// The worker runs until every reporter clone is dropped, makes a last
    /// delivery attempt and resolves to the final counters.
    pub fn spawn(
        sink: Arc<dyn TelemetrySink>,
        config: &TelemetryConfig,
    ) -> (Self, JoinHandle<TelemetryStats>) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let counters = Arc::new(TelemetryCounters::default());

        let worker = DeliveryWorker {
            sink,
            rx,
            backlog: VecDeque::new(),
            backlog_capacity: config.backlog_capacity.max(1),
            sink_timeout: config.sink_timeout(),
            retry_interval: config.retry_interval(),
            counters: Arc::clone(&counters),
        };
        let handle = tokio::spawn(worker.run());

        (Self { tx, counters }, handle)
    }

    /// Start collecting events for `cycle_id`.
    pub fn cycle(&self, cycle_id: u64) -> CycleEvents {
        CycleEvents::new(cycle_id)
    }

    /// Hand a cycle's events to the worker. Returns them with the delivery
    /// status known at enqueue time.
    pub fn report(&self, cycle_id: u64, events: Vec<TelemetryEvent>) -> Vec<TelemetryEvent> {
        if events.is_empty() {
            return events;
        }

        let count = events.len();
        let batch = TelemetryBatch {
            cycle_id,
            events: events.clone(),
        };

        match self.tx.try_send(batch) {
            Ok(()) => {
                TelemetryCounters::add(&self.counters.queued, count);
                events
            }
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => {
                TelemetryCounters::add(&self.counters.dropped, count);
                tracing::warn!(cycle_id, count, "telemetry channel unavailable, batch dropped");
                events
                    .into_iter()
                    .map(|mut event| {
                        event.delivery = Delivery::Dropped;
                        event
                    })
                    .collect()
            }
        }
    }

    pub fn stats(&self) -> TelemetryStats {
        self.counters.snapshot()
    }
}

struct PendingBatch {
    batch: TelemetryBatch,
    attempts: u32,
    first_failure: Option<DateTime<Utc>>,
}

impl PendingBatch {
    /// What goes to the sink on this attempt. A batch that already failed is
    /// marked delayed and followed by a `telemetry_delayed` notice.
    fn outgoing(&self) -> Vec<TelemetryEvent> {
        if self.attempts == 0 {
            return self.batch.events.clone();
        }

        let mut events: Vec<TelemetryEvent> = self
            .batch
            .events
            .iter()
            .cloned()
            .map(|mut event| {
                event.delivery = Delivery::Delayed;
                event
            })
            .collect();
        let next_sequence = events.last().map_or(0, |event| event.sequence + 1);
        events.push(TelemetryEvent::delayed_notice(
            self.batch.cycle_id,
            next_sequence,
            self.batch.events.len(),
            self.attempts,
            self.first_failure,
        ));
        events
    }
}

struct DeliveryWorker {
    sink: Arc<dyn TelemetrySink>,
    rx: mpsc::Receiver<TelemetryBatch>,
    backlog: VecDeque<PendingBatch>,
    backlog_capacity: usize,
    sink_timeout: Duration,
    retry_interval: Duration,
    counters: Arc<TelemetryCounters>,
}

impl DeliveryWorker {
    async fn run(mut self) -> TelemetryStats {
        let mut retry = tokio::time::interval(self.retry_interval);
        retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = self.rx.recv() => match received {
                    Some(batch) => self.enqueue(batch),
                    None => break,
                },
                _ = retry.tick(), if !self.backlog.is_empty() => {}
            }
            self.drain().await;
        }

        // Channel closed: one last attempt, then account for what is left.
        self.drain().await;
        for pending in self.backlog.drain(..) {
            TelemetryCounters::add(&self.counters.dropped, pending.batch.events.len());
            tracing::warn!(
                cycle_id = pending.batch.cycle_id,
                attempts = pending.attempts,
                "telemetry batch undelivered at shutdown"
            );
        }
        self.counters.snapshot()
    }

    fn enqueue(&mut self, batch: TelemetryBatch) {
        if self.backlog.len() >= self.backlog_capacity
            && let Some(oldest) = self.backlog.pop_front()
        {
            TelemetryCounters::add(&self.counters.dropped, oldest.batch.events.len());
            tracing::warn!(
                cycle_id = oldest.batch.cycle_id,
                attempts = oldest.attempts,
                "telemetry backlog full, oldest batch dropped"
            );
        }
        self.backlog.push_back(PendingBatch {
            batch,
            attempts: 0,
            first_failure: None,
        });
    }

    /// Deliver from the head of the backlog until it is empty or the sink
    /// fails. Later batches never overtake an earlier one.
    async fn drain(&mut self) {
        while let Some(head) = self.backlog.front() {
            let outgoing = head.outgoing();
            let was_delayed = head.attempts > 0;
            let batch_len = head.batch.events.len();
            let cycle_id = head.batch.cycle_id;

            match self.attempt(&outgoing).await {
                Ok(()) => {
                    TelemetryCounters::add(&self.counters.delivered, outgoing.len());
                    if was_delayed {
                        TelemetryCounters::add(&self.counters.delayed, batch_len);
                        tracing::info!(cycle_id, events = batch_len, "delayed telemetry delivered");
                    }
                    self.backlog.pop_front();
                }
                Err(error) => {
                    self.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
                    if let Some(head) = self.backlog.front_mut() {
                        head.attempts = head.attempts.saturating_add(1);
                        head.first_failure.get_or_insert_with(Utc::now);
                    }
                    tracing::warn!(cycle_id, %error, "telemetry delivery failed, will retry");
                    break;
                }
            }
        }
    }

    async fn attempt(&self, events: &[TelemetryEvent]) -> Result<(), TelemetryError> {
        match tokio::time::timeout(self.sink_timeout, self.sink.deliver(events)).await {
            Ok(result) => result,
            Err(_) => Err(TelemetryError::SinkTimeout {
                sink: self.sink.name().to_string(),
                timeout_ms: u64::try_from(self.sink_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
