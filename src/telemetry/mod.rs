pub mod event;
pub mod reporter;
pub mod sink;

pub use event::{CycleEvents, Delivery, TelemetryEvent, TelemetryEventKind, in_cycle_order};
pub use reporter::{TelemetryBatch, TelemetryReporter, TelemetryStats};
pub use sink::{
    BroadcastSink, ConfiguredSink, LogSink, MemorySink, NoopSink, TelemetrySink, create_sink,
};
