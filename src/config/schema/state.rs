use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::state::{Mode, SystemState};

/// Initial values for the system state, applied before the first cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialStateConfig {
    #[serde(default)]
    pub position: f64,
    #[serde(default = "default_battery_level")]
    pub battery_level: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub mode: Mode,
}

fn default_battery_level() -> f64 {
    100.0
}

fn default_temperature() -> f64 {
    20.0
}

impl Default for InitialStateConfig {
    fn default() -> Self {
        Self {
            position: 0.0,
            battery_level: default_battery_level(),
            temperature: default_temperature(),
            mode: Mode::Nominal,
        }
    }
}

impl InitialStateConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() || !self.temperature.is_finite() {
            anyhow::bail!("state.position and state.temperature must be finite");
        }
        if !(0.0..=100.0).contains(&self.battery_level) {
            anyhow::bail!("state.battery_level must be in [0, 100]");
        }
        Ok(())
    }

    pub fn to_state(&self) -> SystemState {
        SystemState {
            position: self.position,
            battery_level: self.battery_level,
            temperature: self.temperature,
            mode: self.mode,
            generation: 0,
        }
    }
}
