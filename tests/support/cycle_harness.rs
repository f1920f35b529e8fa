#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use cyclegate::config::{Config, TelemetryConfig};
use cyclegate::core::orchestrator::CycleOrchestrator;
use cyclegate::core::state::SystemState;
use cyclegate::error::TelemetryError;
use cyclegate::security::PolicyHandle;
use cyclegate::telemetry::sink::DeliveryFuture;
use cyclegate::telemetry::{MemorySink, TelemetryEvent, TelemetryReporter, TelemetrySink};

/// Memory-backed sink that can be taken offline.
pub struct FlakySink {
    pub inner: MemorySink,
    offline: AtomicBool,
    attempts: AtomicU32,
}

impl FlakySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemorySink::new(),
            offline: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
        })
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<TelemetryEvent> {
        self.inner.events()
    }
}

impl TelemetrySink for FlakySink {
    fn name(&self) -> &str {
        "flaky"
    }

    fn deliver<'a>(&'a self, events: &'a [TelemetryEvent]) -> DeliveryFuture<'a> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(TelemetryError::SinkUnavailable {
                    sink: "flaky".into(),
                    message: "offline".into(),
                });
            }
            self.inner.deliver(events).await
        })
    }
}

pub fn fast_telemetry() -> TelemetryConfig {
    TelemetryConfig {
        retry_interval_ms: 10,
        sink_timeout_ms: 50,
        ..TelemetryConfig::default()
    }
}

/// Orchestrator over `initial` with default policy, reporting into `sink`.
pub fn orchestrator(initial: SystemState, sink: Arc<dyn TelemetrySink>) -> CycleOrchestrator {
    let (reporter, _worker) = TelemetryReporter::spawn(sink, &fast_telemetry());
    CycleOrchestrator::new(initial, PolicyHandle::new(Config::default().policy), reporter)
}

pub fn with_battery(battery_level: f64) -> SystemState {
    SystemState {
        battery_level,
        ..SystemState::default()
    }
}

/// Let the delivery worker catch up.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}
