use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Versioned policy rules for the safety gate.
///
/// `override_authorize` and `lock` are operator inputs; they never mutate
/// intent or state and always show up in the decision reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_battery_floor")]
    pub battery_floor: f64,
    #[serde(default = "default_battery_warning")]
    pub battery_warning: f64,
    #[serde(default = "default_temperature_ceiling")]
    pub temperature_ceiling: f64,
    #[serde(default = "default_temperature_warning")]
    pub temperature_warning: f64,
    #[serde(default = "default_position_min")]
    pub position_min: f64,
    #[serde(default = "default_position_max")]
    pub position_max: f64,
    #[serde(default = "default_authorization_threshold")]
    pub authorization_threshold: f64,
    #[serde(default = "default_warning_penalty")]
    pub warning_penalty: f64,
    #[serde(default = "default_low_power_penalty")]
    pub low_power_penalty: f64,
    #[serde(default)]
    pub override_authorize: bool,
    #[serde(default)]
    pub lock: bool,
}

fn default_version() -> u32 {
    1
}

fn default_battery_floor() -> f64 {
    5.0
}

fn default_battery_warning() -> f64 {
    10.0
}

fn default_temperature_ceiling() -> f64 {
    140.0
}

fn default_temperature_warning() -> f64 {
    120.0
}

fn default_position_min() -> f64 {
    -10.0
}

fn default_position_max() -> f64 {
    10.0
}

fn default_authorization_threshold() -> f64 {
    50.0
}

fn default_warning_penalty() -> f64 {
    30.0
}

fn default_low_power_penalty() -> f64 {
    20.0
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            battery_floor: default_battery_floor(),
            battery_warning: default_battery_warning(),
            temperature_ceiling: default_temperature_ceiling(),
            temperature_warning: default_temperature_warning(),
            position_min: default_position_min(),
            position_max: default_position_max(),
            authorization_threshold: default_authorization_threshold(),
            warning_penalty: default_warning_penalty(),
            low_power_penalty: default_low_power_penalty(),
            override_authorize: false,
            lock: false,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("battery_floor", self.battery_floor),
            ("battery_warning", self.battery_warning),
            ("temperature_ceiling", self.temperature_ceiling),
            ("temperature_warning", self.temperature_warning),
            ("position_min", self.position_min),
            ("position_max", self.position_max),
            ("authorization_threshold", self.authorization_threshold),
            ("warning_penalty", self.warning_penalty),
            ("low_power_penalty", self.low_power_penalty),
        ];
        for (key, value) in scalars {
            if !value.is_finite() {
                anyhow::bail!("policy.{key} must be a finite number");
            }
        }
        if self.version == 0 {
            anyhow::bail!("policy.version must be >= 1");
        }
        if !(0.0..=100.0).contains(&self.battery_floor) {
            anyhow::bail!("policy.battery_floor must be in [0, 100]");
        }
        if self.battery_warning < self.battery_floor {
            anyhow::bail!("policy.battery_warning must be >= policy.battery_floor");
        }
        if self.temperature_warning > self.temperature_ceiling {
            anyhow::bail!("policy.temperature_warning must be <= policy.temperature_ceiling");
        }
        if self.position_min >= self.position_max {
            anyhow::bail!("policy.position_min must be < policy.position_max");
        }
        if !(0.0..=100.0).contains(&self.authorization_threshold) {
            anyhow::bail!("policy.authorization_threshold must be in [0, 100]");
        }
        if self.warning_penalty < 0.0 || self.low_power_penalty < 0.0 {
            anyhow::bail!("policy penalties must be >= 0");
        }
        Ok(())
    }
}
