use serde::{Deserialize, Serialize};
use strum::Display;

use crate::core::state::{Domain, Mode};
use crate::error::IntentError;

const MAX_DELTA_V: f64 = 100.0;
const MAX_RECOVERY_STEP: f64 = 100.0;

/// Closed set of commands an external source may request.
///
/// Validated once at submission so everything downstream can match
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AdjustOrbit { delta_v: f64 },
    SetMode { mode: Mode },
    BatteryRecovery { charge: f64 },
    ThermalRecovery { cooling: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    AdjustOrbit,
    SetMode,
    BatteryRecovery,
    ThermalRecovery,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::AdjustOrbit { .. } => CommandKind::AdjustOrbit,
            Self::SetMode { .. } => CommandKind::SetMode,
            Self::BatteryRecovery { .. } => CommandKind::BatteryRecovery,
            Self::ThermalRecovery { .. } => CommandKind::ThermalRecovery,
        }
    }

    /// Parse a raw command from an external source.
    pub fn from_json(raw: &str) -> Result<Self, IntentError> {
        let command: Self = serde_json::from_str(raw)
            .map_err(|e| IntentError::InvalidCommand(format!("malformed payload: {e}")))?;
        command.validate()?;
        Ok(command)
    }

    /// Structural validation; does not look at system state.
    pub fn validate(&self) -> Result<(), IntentError> {
        match *self {
            Self::AdjustOrbit { delta_v } => {
                if !delta_v.is_finite() {
                    return Err(invalid("adjust_orbit.delta_v must be finite"));
                }
                if delta_v == 0.0 {
                    return Err(invalid("adjust_orbit.delta_v must be non-zero"));
                }
                if delta_v.abs() > MAX_DELTA_V {
                    return Err(invalid(format!(
                        "adjust_orbit.delta_v must be within +/-{MAX_DELTA_V}"
                    )));
                }
            }
            Self::SetMode { .. } => {}
            Self::BatteryRecovery { charge } => {
                check_recovery_step("battery_recovery.charge", charge)?;
            }
            Self::ThermalRecovery { cooling } => {
                check_recovery_step("thermal_recovery.cooling", cooling)?;
            }
        }
        Ok(())
    }

    /// State domains this command may push in the wrong direction.
    pub fn affected_domains(&self) -> &'static [Domain] {
        match self {
            Self::AdjustOrbit { .. } => &[Domain::Battery, Domain::Thermal, Domain::Position],
            Self::SetMode { .. } => &[],
            Self::BatteryRecovery { .. } => &[Domain::Battery],
            Self::ThermalRecovery { .. } => &[Domain::Thermal],
        }
    }

    /// The domain this command restores, if it is a recovery action.
    pub fn recovers(&self) -> Option<Domain> {
        match self {
            Self::BatteryRecovery { .. } => Some(Domain::Battery),
            Self::ThermalRecovery { .. } => Some(Domain::Thermal),
            Self::AdjustOrbit { .. } | Self::SetMode { .. } => None,
        }
    }

    pub fn is_recovery(&self) -> bool {
        self.recovers().is_some()
    }

    pub fn is_energy_intensive(&self) -> bool {
        matches!(self, Self::AdjustOrbit { .. })
    }
}

fn check_recovery_step(field: &str, value: f64) -> Result<(), IntentError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{field} must be a positive finite number")));
    }
    if value > MAX_RECOVERY_STEP {
        return Err(invalid(format!("{field} must be <= {MAX_RECOVERY_STEP}")));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> IntentError {
    IntentError::InvalidCommand(message.into())
}
