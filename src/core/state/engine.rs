use serde::{Deserialize, Serialize};

use super::types::{FieldChange, StateField, StateValue, SystemState};
use crate::core::intent::{Command, CommandKind, Intent, IntentId, IntentStatus};
use crate::error::EngineError;

const BATTERY_MAX: f64 = 100.0;
const BURN_COST_PER_DELTA_V: f64 = 2.0;
const HEAT_PER_DELTA_V: f64 = 1.5;

/// Exactly what one applied intent changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub intent_id: IntentId,
    pub command: CommandKind,
    pub generation_before: u64,
    pub generation_after: u64,
    pub changes: Vec<FieldChange>,
}

/// Pure state transition for one authorized intent. Total over [`Command`].
pub fn transition(state: &SystemState, intent: &Intent) -> (SystemState, StateDelta) {
    let mut next = *state;
    let mut changes = Vec::new();

    match intent.command {
        Command::AdjustOrbit { delta_v } => {
            let burn = delta_v.abs();
            next.position = state.position + delta_v;
            next.battery_level = (state.battery_level - burn * BURN_COST_PER_DELTA_V).max(0.0);
            next.temperature = state.temperature + burn * HEAT_PER_DELTA_V;
            push_scalar(&mut changes, StateField::Position, state.position, next.position);
            push_scalar(
                &mut changes,
                StateField::BatteryLevel,
                state.battery_level,
                next.battery_level,
            );
            push_scalar(
                &mut changes,
                StateField::Temperature,
                state.temperature,
                next.temperature,
            );
        }
        Command::SetMode { mode } => {
            next.mode = mode;
            if state.mode != mode {
                changes.push(FieldChange {
                    field: StateField::Mode,
                    before: StateValue::Mode(state.mode),
                    after: StateValue::Mode(mode),
                });
            }
        }
        Command::BatteryRecovery { charge } => {
            next.battery_level = (state.battery_level + charge).min(BATTERY_MAX);
            push_scalar(
                &mut changes,
                StateField::BatteryLevel,
                state.battery_level,
                next.battery_level,
            );
        }
        Command::ThermalRecovery { cooling } => {
            next.temperature = state.temperature - cooling;
            push_scalar(
                &mut changes,
                StateField::Temperature,
                state.temperature,
                next.temperature,
            );
        }
    }

    // An applied intent is a mutation even when every field already held
    // the requested value.
    next.generation = state.generation + 1;

    let delta = StateDelta {
        intent_id: intent.id,
        command: intent.command.kind(),
        generation_before: state.generation,
        generation_after: next.generation,
        changes,
    };
    (next, delta)
}

#[allow(clippy::float_cmp)]
fn push_scalar(changes: &mut Vec<FieldChange>, field: StateField, before: f64, after: f64) {
    if before != after {
        changes.push(FieldChange {
            field,
            before: StateValue::Scalar(before),
            after: StateValue::Scalar(after),
        });
    }
}

/// Sole owner of the live [`SystemState`].
///
/// Enforces one mutation per cycle: [`StateEngine::begin_cycle`] arms the
/// guard and a second [`StateEngine::apply`] in the same cycle is an
/// `InvariantViolation`.
#[derive(Debug)]
pub struct StateEngine {
    state: SystemState,
    cycle_id: Option<u64>,
    mutated: bool,
}

impl StateEngine {
    pub fn new(initial: SystemState) -> Self {
        Self {
            state: initial,
            cycle_id: None,
            mutated: false,
        }
    }

    pub fn snapshot(&self) -> SystemState {
        self.state
    }

    pub fn begin_cycle(&mut self, cycle_id: u64) {
        self.cycle_id = Some(cycle_id);
        self.mutated = false;
    }

    /// Whether `intent`'s command can be applied at all, regardless of its
    /// status. Never touches state.
    pub fn admit(&self, intent: &Intent) -> Result<(), EngineError> {
        intent
            .command
            .validate()
            .map_err(|e| EngineError::UnreachableIntent {
                id: intent.id,
                reason: e.to_string(),
            })
    }

    pub fn apply(&mut self, intent: &Intent) -> Result<StateDelta, EngineError> {
        let cycle_id = self.armed_cycle()?;

        if intent.status != IntentStatus::Authorized {
            return Err(EngineError::UnreachableIntent {
                id: intent.id,
                reason: format!("status is {}, expected authorized", intent.status),
            });
        }
        self.admit(intent)?;

        let (next, delta) = transition(&self.state, intent);
        self.commit(cycle_id, next)?;

        tracing::info!(
            cycle_id,
            intent_id = %intent.id,
            generation = next.generation,
            "state updated"
        );
        Ok(delta)
    }

    fn armed_cycle(&self) -> Result<u64, EngineError> {
        let Some(cycle_id) = self.cycle_id else {
            return Err(EngineError::InvariantViolation {
                cycle_id: 0,
                message: "apply called outside of a cycle".into(),
            });
        };
        if self.mutated {
            return Err(EngineError::InvariantViolation {
                cycle_id,
                message: "second mutation attempted in one cycle".into(),
            });
        }
        Ok(cycle_id)
    }

    fn commit(&mut self, cycle_id: u64, next: SystemState) -> Result<(), EngineError> {
        if next.generation != self.state.generation + 1 {
            return Err(EngineError::InvariantViolation {
                cycle_id,
                message: format!(
                    "generation {} -> {} is not a single step",
                    self.state.generation, next.generation
                ),
            });
        }
        self.state = next;
        self.mutated = true;
        Ok(())
    }
}
