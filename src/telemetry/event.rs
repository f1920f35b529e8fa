use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use strum::Display;
use uuid::Uuid;

use crate::core::intent::{Intent, IntentId};
use crate::core::state::{StateDelta, SystemState};
use crate::security::{PolicyDecision, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TelemetryEventKind {
    IntentReceived,
    IntentExpired,
    IntentBlocked,
    IntentAuthorized,
    StateUpdated,
    ExecutionLatency,
    TelemetryDelayed,
}

impl TelemetryEventKind {
    /// Position within a cycle. Events of a cycle are emitted in
    /// non-decreasing rank.
    pub fn rank(self) -> u8 {
        match self {
            Self::IntentReceived => 0,
            Self::IntentExpired => 1,
            Self::IntentBlocked | Self::IntentAuthorized => 2,
            Self::StateUpdated => 3,
            Self::ExecutionLatency => 4,
            Self::TelemetryDelayed => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Delivery {
    Immediate,
    Delayed,
    Dropped,
}

/// Observational record of something that happened in a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: Uuid,
    pub kind: TelemetryEventKind,
    pub cycle_id: u64,
    pub sequence: u32,
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
    pub delivery: Delivery,
}

impl TelemetryEvent {
    fn new(kind: TelemetryEventKind, cycle_id: u64, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            cycle_id,
            sequence: 0,
            payload,
            emitted_at: Utc::now(),
            delivery: Delivery::Immediate,
        }
    }

    /// Notice appended to a batch that reached the sink late.
    pub(crate) fn delayed_notice(
        cycle_id: u64,
        sequence: u32,
        delayed_events: usize,
        attempts: u32,
        first_failure: Option<DateTime<Utc>>,
    ) -> Self {
        let mut event = Self::new(
            TelemetryEventKind::TelemetryDelayed,
            cycle_id,
            json!({
                "delayed_events": delayed_events,
                "attempts": attempts,
                "first_failure": first_failure,
            }),
        );
        event.sequence = sequence;
        event.delivery = Delivery::Delayed;
        event
    }
}

/// Whether `events` respect the in-cycle ordering.
pub fn in_cycle_order(events: &[TelemetryEvent]) -> bool {
    events.windows(2).all(|pair| {
        pair[0].cycle_id != pair[1].cycle_id
            || (pair[0].kind.rank() <= pair[1].kind.rank() && pair[0].sequence < pair[1].sequence)
    })
}

/// Collects one cycle's events; [`CycleEvents::finish`] fixes their order.
#[derive(Debug)]
pub struct CycleEvents {
    cycle_id: u64,
    events: Vec<TelemetryEvent>,
}

impl CycleEvents {
    pub(crate) fn new(cycle_id: u64) -> Self {
        Self {
            cycle_id,
            events: Vec::new(),
        }
    }

    pub fn cycle_id(&self) -> u64 {
        self.cycle_id
    }

    pub fn intent_received(&mut self, intent: &Intent) -> &mut Self {
        self.push(
            TelemetryEventKind::IntentReceived,
            json!({
                "intent_id": intent.id,
                "command": intent.command,
                "submitted_at": intent.submitted_at,
            }),
        )
    }

    pub fn intent_expired(&mut self, intent_id: IntentId) -> &mut Self {
        self.push(
            TelemetryEventKind::IntentExpired,
            json!({ "intent_id": intent_id }),
        )
    }

    pub fn decision(&mut self, decision: &PolicyDecision) -> &mut Self {
        let kind = match decision.verdict {
            Verdict::Authorize => TelemetryEventKind::IntentAuthorized,
            Verdict::Block => TelemetryEventKind::IntentBlocked,
        };
        self.push(
            kind,
            json!({
                "intent_id": decision.intent_id,
                "score": decision.score,
                "reason_code": decision.reason_code,
                "reason": decision.reason,
                "triggered": decision.triggered,
                "policy_version": decision.policy_version,
            }),
        )
    }

    pub fn state_updated(&mut self, delta: &StateDelta, state: &SystemState) -> &mut Self {
        self.push(
            TelemetryEventKind::StateUpdated,
            json!({
                "delta": delta,
                "state": state,
            }),
        )
    }

    pub fn execution_latency(&mut self, elapsed: Duration, mutated: bool) -> &mut Self {
        let latency_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.push(
            TelemetryEventKind::ExecutionLatency,
            json!({
                "latency_us": latency_us,
                "mutated": mutated,
            }),
        )
    }

    /// Stable-sort by rank and number the events.
    pub fn finish(self) -> Vec<TelemetryEvent> {
        let mut events = self.events;
        events.sort_by_key(|event| event.kind.rank());
        for (sequence, event) in (0u32..).zip(events.iter_mut()) {
            event.sequence = sequence;
        }
        events
    }

    fn push(&mut self, kind: TelemetryEventKind, payload: serde_json::Value) -> &mut Self {
        self.events
            .push(TelemetryEvent::new(kind, self.cycle_id, payload));
        self
    }
}
