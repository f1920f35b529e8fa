use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TelemetryBackend {
    #[default]
    Log,
    Memory,
    Broadcast,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub backend: TelemetryBackend,
    /// Batches the orchestrator may queue ahead of the delivery worker.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Undelivered batches the worker holds while the sink is down.
    #[serde(default = "default_backlog_capacity")]
    pub backlog_capacity: usize,
    #[serde(default = "default_sink_timeout_ms")]
    pub sink_timeout_ms: u64,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

fn default_backlog_capacity() -> usize {
    256
}

fn default_sink_timeout_ms() -> u64 {
    500
}

fn default_retry_interval_ms() -> u64 {
    1_000
}

fn default_broadcast_capacity() -> usize {
    1_024
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            backend: TelemetryBackend::Log,
            channel_capacity: default_channel_capacity(),
            backlog_capacity: default_backlog_capacity(),
            sink_timeout_ms: default_sink_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            anyhow::bail!("telemetry.channel_capacity must be >= 1");
        }
        if self.backlog_capacity == 0 {
            anyhow::bail!("telemetry.backlog_capacity must be >= 1");
        }
        if self.sink_timeout_ms == 0 {
            anyhow::bail!("telemetry.sink_timeout_ms must be >= 1");
        }
        if self.retry_interval_ms == 0 {
            anyhow::bail!("telemetry.retry_interval_ms must be >= 1");
        }
        if self.broadcast_capacity == 0 {
            anyhow::bail!("telemetry.broadcast_capacity must be >= 1");
        }
        Ok(())
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
