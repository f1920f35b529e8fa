use std::sync::Arc;

use super::{BroadcastSink, LogSink, MemorySink, NoopSink, TelemetrySink};
use crate::config::{TelemetryBackend, TelemetryConfig};

/// Sink chosen by configuration, plus the concrete handle for backends that
/// expose a read side.
pub struct ConfiguredSink {
    pub sink: Arc<dyn TelemetrySink>,
    pub memory: Option<MemorySink>,
    pub broadcast: Option<BroadcastSink>,
}

/// Factory: create the right sink from config
pub fn create_sink(config: &TelemetryConfig) -> ConfiguredSink {
    match config.backend {
        TelemetryBackend::Log => ConfiguredSink {
            sink: Arc::new(LogSink::new()),
            memory: None,
            broadcast: None,
        },
        TelemetryBackend::Memory => {
            let memory = MemorySink::new();
            ConfiguredSink {
                sink: Arc::new(memory.clone()),
                memory: Some(memory),
                broadcast: None,
            }
        }
        TelemetryBackend::Broadcast => {
            let broadcast = BroadcastSink::new(config.broadcast_capacity);
            ConfiguredSink {
                sink: Arc::new(broadcast.clone()),
                memory: None,
                broadcast: Some(broadcast),
            }
        }
        TelemetryBackend::None => ConfiguredSink {
            sink: Arc::new(NoopSink),
            memory: None,
            broadcast: None,
        },
    }
}
