use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;

use super::command::Command;

/// Monotonic intent identifier, assigned at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(pub u64);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Authorized,
    Blocked,
    Applied,
    Expired,
}

impl IntentStatus {
    /// Edges of the lifecycle graph. Nothing returns to `Pending` and
    /// `Applied`/`Expired` are terminal.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Authorized | Self::Blocked | Self::Expired)
                | (Self::Blocked, Self::Authorized | Self::Expired)
                | (Self::Authorized, Self::Applied)
        )
    }

    /// Still waiting for the gate: pending, or blocked and up for re-evaluation.
    pub fn is_awaiting(self) -> bool {
        matches!(self, Self::Pending | Self::Blocked)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Expired)
    }
}

/// Durable, timestamped record of a requested action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    pub command: Command,
    pub submitted_at: DateTime<Utc>,
    pub status: IntentStatus,
    pub updated_at: DateTime<Utc>,
}
