use serde::Serialize;
use strum::Display;

use crate::core::intent::IntentId;
use crate::core::state::StateDelta;
use crate::security::PolicyDecision;
use crate::telemetry::TelemetryEvent;

/// Where the orchestrator is inside a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    Evaluating,
    Authorizing,
    Blocking,
    Applying,
    Reporting,
}

/// A gate decision kept for audit, tagged with the cycle that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub cycle_id: u64,
    pub decision: PolicyDecision,
}

/// Outcome of one [`run_cycle`](super::CycleOrchestrator::run_cycle).
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: u64,
    /// Phases traversed, from `evaluating` to `reporting`.
    pub phases: Vec<CyclePhase>,
    pub decisions: Vec<PolicyDecision>,
    pub delta: Option<StateDelta>,
    pub expired: Vec<IntentId>,
    pub generation_before: u64,
    pub generation_after: u64,
    /// Events as handed to the reporter, with their enqueue-time delivery.
    pub events: Vec<TelemetryEvent>,
}

impl CycleReport {
    pub fn mutated(&self) -> bool {
        self.delta.is_some()
    }

    pub fn authorized(&self) -> Option<&PolicyDecision> {
        self.decisions.iter().find(|decision| decision.is_authorized())
    }

    pub fn blocked(&self) -> impl Iterator<Item = &PolicyDecision> {
        self.decisions
            .iter()
            .filter(|decision| !decision.is_authorized())
    }
}
