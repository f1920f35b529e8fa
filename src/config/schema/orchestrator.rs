use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Age after which awaiting intent is expired. Unset keeps blocked
    /// intent indefinitely.
    #[serde(default)]
    pub intent_ttl_secs: Option<u64>,
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_cycle_interval_ms() -> u64 {
    1_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            intent_ttl_secs: None,
            cycle_interval_ms: default_cycle_interval_ms(),
            max_cycles: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.intent_ttl_secs == Some(0) {
            anyhow::bail!("orchestrator.intent_ttl_secs must be >= 1 when set");
        }
        if self.cycle_interval_ms == 0 {
            anyhow::bail!("orchestrator.cycle_interval_ms must be >= 1");
        }
        Ok(())
    }

    pub fn intent_ttl(&self) -> Option<chrono::Duration> {
        self.intent_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}
