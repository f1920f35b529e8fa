use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use super::command::Command;
use super::types::{Intent, IntentId, IntentStatus};
use crate::error::IntentError;

/// Owns storage and lifecycle of intents.
///
/// Records are never removed: blocked and expired intent stays for audit.
/// Ids are monotonic, so map order is submission order.
#[derive(Debug, Default)]
pub struct IntentManager {
    intents: BTreeMap<IntentId, Intent>,
    next_id: u64,
    received: Vec<IntentId>,
}

impl IntentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `command` and store it as a pending intent.
    pub fn submit(&mut self, command: Command) -> Result<Intent, IntentError> {
        self.submit_at(command, Utc::now())
    }

    /// Parse and submit a raw JSON command.
    pub fn submit_json(&mut self, raw: &str) -> Result<Intent, IntentError> {
        let command = Command::from_json(raw)?;
        self.submit(command)
    }

    /// Submit with an explicit timestamp (replays, tests).
    pub fn submit_at(
        &mut self,
        command: Command,
        submitted_at: DateTime<Utc>,
    ) -> Result<Intent, IntentError> {
        command.validate()?;

        self.next_id += 1;
        let intent = Intent {
            id: IntentId(self.next_id),
            command,
            submitted_at,
            status: IntentStatus::Pending,
            updated_at: submitted_at,
        };
        tracing::debug!(intent_id = %intent.id, kind = %intent.command.kind(), "intent submitted");

        self.received.push(intent.id);
        self.intents.insert(intent.id, intent.clone());
        Ok(intent)
    }

    /// Intent with status `pending`, in submission order.
    pub fn pending(&self) -> Vec<Intent> {
        self.filtered(|status| status == IntentStatus::Pending)
    }

    /// Pending and blocked intent, in submission order: everything the gate
    /// still has to decide on.
    pub fn awaiting(&self) -> Vec<Intent> {
        self.filtered(IntentStatus::is_awaiting)
    }

    pub fn get(&self, id: IntentId) -> Option<&Intent> {
        self.intents.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Intent> {
        self.intents.values()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// The only mutator. Validates the edge before touching the record.
    pub fn mark(&mut self, id: IntentId, status: IntentStatus) -> Result<&Intent, IntentError> {
        let intent = self
            .intents
            .get_mut(&id)
            .ok_or(IntentError::UnknownIntent(id))?;

        if !intent.status.can_transition_to(status) {
            return Err(IntentError::IllegalTransition {
                id,
                from: intent.status,
                to: status,
            });
        }

        tracing::debug!(intent_id = %id, from = %intent.status, to = %status, "intent transition");
        intent.status = status;
        intent.updated_at = Utc::now();
        Ok(intent)
    }

    /// Ids submitted since the previous call.
    pub fn take_received(&mut self) -> Vec<IntentId> {
        std::mem::take(&mut self.received)
    }

    /// Awaiting intent older than `ttl` at `now`.
    pub fn expired_candidates(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<IntentId> {
        self.intents
            .values()
            .filter(|intent| intent.status.is_awaiting() && now - intent.submitted_at > ttl)
            .map(|intent| intent.id)
            .collect()
    }

    fn filtered(&self, keep: impl Fn(IntentStatus) -> bool) -> Vec<Intent> {
        self.intents
            .values()
            .filter(|intent| keep(intent.status))
            .cloned()
            .collect()
    }
}
