mod types;


pub use types::{CyclePhase, CycleReport, DecisionRecord};

use chrono::Utc;
use std::time::Instant;

use crate::config::{Config, PolicyConfig};
use crate::core::intent::{Command, Intent, IntentId, IntentManager, IntentStatus};
use crate::core::state::{StateDelta, StateEngine, SystemState};
use crate::error::{CycleError, EngineError, Result};
use crate::security::{PolicyHandle, Verdict};
use crate::telemetry::{CycleEvents, TelemetryReporter, TelemetryStats};

/// Drives one cycle at a time through intent, gate, engine and telemetry.
///
/// The orchestrator is the only caller of [`StateEngine::apply`]. After an
/// invariant violation it refuses every further cycle.
pub struct CycleOrchestrator {
    intents: IntentManager,
    policy: PolicyHandle,
    engine: StateEngine,
    reporter: TelemetryReporter,
    cycle_id: u64,
    phase: CyclePhase,
    halted: Option<String>,
    audit: Vec<DecisionRecord>,
    intent_ttl: Option<chrono::Duration>,
}

impl CycleOrchestrator {
    pub fn new(initial: SystemState, policy: PolicyHandle, reporter: TelemetryReporter) -> Self {
        Self {
            intents: IntentManager::new(),
            policy,
            engine: StateEngine::new(initial),
            reporter,
            cycle_id: 0,
            phase: CyclePhase::Idle,
            halted: None,
            audit: Vec::new(),
            intent_ttl: None,
        }
    }

    /// Bootstrap from configuration: initial state, policy and TTL.
    pub fn from_config(config: &Config, reporter: TelemetryReporter) -> Self {
        Self::new(
            config.state.to_state(),
            PolicyHandle::new(config.policy.clone()),
            reporter,
        )
        .with_intent_ttl(config.orchestrator.intent_ttl())
    }

    /// Expire pending and blocked intent older than `ttl`. `None` keeps it
    /// forever.
    pub fn with_intent_ttl(mut self, ttl: Option<chrono::Duration>) -> Self {
        self.intent_ttl = ttl;
        self
    }

    pub fn submit(&mut self, command: Command) -> Result<IntentId> {
        Ok(self.intents.submit(command)?.id)
    }

    pub fn submit_json(&mut self, raw: &str) -> Result<IntentId> {
        Ok(self.intents.submit_json(raw)?.id)
    }

    /// Run one full cycle.
    ///
    /// At most one intent is applied. Gate errors abort the cycle before any
    /// mutation and leave the orchestrator usable; an invariant violation
    /// halts it.
    #[allow(clippy::too_many_lines)]
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        if let Some(reason) = &self.halted {
            return Err(CycleError::Halted {
                cycle_id: self.cycle_id,
                reason: reason.clone(),
            });
        }

        let started = Instant::now();
        self.cycle_id += 1;
        let cycle_id = self.cycle_id;
        let mut phases = Vec::new();

        // ── Evaluating ──
        self.enter(&mut phases, CyclePhase::Evaluating);
        self.engine.begin_cycle(cycle_id);
        let mut events = self.reporter.cycle(cycle_id);

        for id in self.intents.take_received() {
            if let Some(intent) = self.intents.get(id) {
                events.intent_received(intent);
            }
        }

        let expired = match self.expire(&mut events) {
            Ok(expired) => expired,
            Err(error) => return Err(self.abort(events, started, error)),
        };

        let before = self.engine.snapshot();
        let gate = self.policy.gate();
        let mut decisions = Vec::new();
        let mut authorized: Option<Intent> = None;

        for intent in self.intents.awaiting() {
            let decision = match gate.evaluate(&intent, &before) {
                Ok(decision) => decision,
                Err(error) => return Err(self.abort(events, started, error.into())),
            };
            events.decision(&decision);
            self.audit.push(DecisionRecord {
                cycle_id,
                decision: decision.clone(),
            });

            match decision.verdict {
                Verdict::Block => {
                    tracing::info!(
                        cycle_id,
                        intent_id = %intent.id,
                        verdict = %decision.verdict,
                        reason = %decision.reason,
                        "intent blocked"
                    );
                    if intent.status == IntentStatus::Pending
                        && let Err(error) = self.intents.mark(intent.id, IntentStatus::Blocked)
                    {
                        return Err(self.abort(events, started, error.into()));
                    }
                    decisions.push(decision);
                }
                Verdict::Authorize => {
                    tracing::info!(
                        cycle_id,
                        intent_id = %intent.id,
                        verdict = %decision.verdict,
                        score = decision.score,
                        "intent authorized"
                    );
                    // Checked before marking so a rejected intent never sits in authorized.
                    if let Err(error) = self.engine.admit(&intent) {
                        return Err(self.abort(events, started, error.into()));
                    }
                    match self.intents.mark(intent.id, IntentStatus::Authorized) {
                        Ok(marked) => authorized = Some(marked.clone()),
                        Err(error) => return Err(self.abort(events, started, error.into())),
                    }
                    decisions.push(decision);
                    break;
                }
            }
        }

        // One outcome phase per cycle.
        if authorized.is_some() {
            self.enter(&mut phases, CyclePhase::Authorizing);
        } else if !decisions.is_empty() {
            self.enter(&mut phases, CyclePhase::Blocking);
        }

        // ── Applying ──
        let mut delta: Option<StateDelta> = None;
        if let Some(intent) = authorized {
            self.enter(&mut phases, CyclePhase::Applying);
            match self.engine.apply(&intent) {
                Ok(applied) => {
                    if let Err(error) = self.intents.mark(intent.id, IntentStatus::Applied) {
                        return Err(self.abort(events, started, error.into()));
                    }
                    events.state_updated(&applied, &self.engine.snapshot());
                    delta = Some(applied);
                }
                Err(error) => return Err(self.abort(events, started, error.into())),
            }
        }

        let after = self.engine.snapshot();
        if let Err(violation) = verify_generation(cycle_id, &before, &after, delta.is_some()) {
            return Err(self.abort(events, started, violation.into()));
        }

        // ── Reporting ──
        self.enter(&mut phases, CyclePhase::Reporting);
        events.execution_latency(started.elapsed(), delta.is_some());
        let events = self.reporter.report(cycle_id, events.finish());
        self.phase = CyclePhase::Idle;

        tracing::debug!(
            cycle_id,
            decisions = decisions.len(),
            mutated = delta.is_some(),
            generation = after.generation,
            "cycle complete"
        );

        Ok(CycleReport {
            cycle_id,
            phases,
            decisions,
            delta,
            expired,
            generation_before: before.generation,
            generation_after: after.generation,
            events,
        })
    }

    /// Install a new policy. Its version must be strictly newer than the
    /// active one.
    pub fn replace_policy(&self, config: PolicyConfig) -> Result<()> {
        self.policy.replace(config)?;
        Ok(())
    }

    /// Shared handle for an operator task to flip lock/override.
    pub fn policy_handle(&self) -> PolicyHandle {
        self.policy.clone()
    }

    pub fn snapshot(&self) -> SystemState {
        self.engine.snapshot()
    }

    pub fn intents(&self) -> &IntentManager {
        &self.intents
    }

    /// Every gate decision so far, oldest first.
    pub fn decisions(&self) -> &[DecisionRecord] {
        &self.audit
    }

    pub fn cycle_id(&self) -> u64 {
        self.cycle_id
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn telemetry_stats(&self) -> TelemetryStats {
        self.reporter.stats()
    }

    fn enter(&mut self, phases: &mut Vec<CyclePhase>, phase: CyclePhase) {
        self.phase = phase;
        if phases.last() != Some(&phase) {
            phases.push(phase);
        }
    }

    fn expire(&mut self, events: &mut CycleEvents) -> Result<Vec<IntentId>> {
        let Some(ttl) = self.intent_ttl else {
            return Ok(Vec::new());
        };

        let expired = self.intents.expired_candidates(Utc::now(), ttl);
        for id in &expired {
            self.intents.mark(*id, IntentStatus::Expired)?;
            events.intent_expired(*id);
            tracing::info!(cycle_id = self.cycle_id, intent_id = %id, "intent expired");
        }
        Ok(expired)
    }

    /// End a cycle early. Whatever was observed is still reported; a fatal
    /// error halts the orchestrator.
    fn abort(&mut self, mut events: CycleEvents, started: Instant, error: CycleError) -> CycleError {
        let cycle_id = events.cycle_id();
        if error.is_fatal() {
            tracing::error!(cycle_id, %error, "invariant violated, orchestrator halted");
            self.halted = Some(error.to_string());
        } else {
            tracing::warn!(cycle_id, %error, "cycle aborted");
        }

        self.phase = CyclePhase::Reporting;
        events.execution_latency(started.elapsed(), false);
        self.reporter.report(cycle_id, events.finish());
        self.phase = CyclePhase::Idle;
        error
    }
}

/// A cycle moves the generation by exactly one when it mutated and not at
/// all otherwise.
fn verify_generation(
    cycle_id: u64,
    before: &SystemState,
    after: &SystemState,
    mutated: bool,
) -> std::result::Result<(), EngineError> {
    let expected = before.generation + u64::from(mutated);
    if after.generation == expected {
        return Ok(());
    }
    Err(EngineError::InvariantViolation {
        cycle_id,
        message: format!(
            "generation {} -> {}, expected {expected}",
            before.generation, after.generation
        ),
    })
}
