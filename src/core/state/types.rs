use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    #[default]
    Nominal,
    LowPower,
    Safe,
}

/// A safety dimension of the system state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Domain {
    Battery,
    Thermal,
    Position,
    Mode,
}

/// Snapshot of the controlled system.
///
/// The live value is owned by [`super::StateEngine`]; everything else works
/// on copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub position: f64,
    pub battery_level: f64,
    pub temperature: f64,
    pub mode: Mode,
    pub generation: u64,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            position: 0.0,
            battery_level: 100.0,
            temperature: 20.0,
            mode: Mode::Nominal,
            generation: 0,
        }
    }
}

/// Field of [`SystemState`] touched by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateField {
    Position,
    BatteryLevel,
    Temperature,
    Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Scalar(f64),
    Mode(Mode),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: StateField,
    pub before: StateValue,
    pub after: StateValue,
}
