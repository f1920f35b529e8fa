use serde::{Deserialize, Serialize};
use strum::Display;

use crate::core::intent::IntentId;
use crate::core::state::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Verdict {
    Authorize,
    Block,
}

/// Machine-checkable reason behind a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReasonCode {
    /// Score met the authorization threshold.
    ScoreAboveThreshold,
    /// Score fell short of the threshold.
    BelowThreshold,
    /// At least one critical domain check failed.
    CriticalDomain,
    /// Operator lock forced a block.
    Locked,
    /// Operator override forced an authorization below threshold.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCheck {
    pub domain: Domain,
    pub outcome: CheckOutcome,
    pub penalty: f64,
    pub detail: String,
}

impl DomainCheck {
    pub(super) fn critical(domain: Domain, detail: impl Into<String>) -> Self {
        Self {
            domain,
            outcome: CheckOutcome::Critical,
            penalty: 0.0,
            detail: detail.into(),
        }
    }

    pub(super) fn warning(domain: Domain, penalty: f64, detail: impl Into<String>) -> Self {
        Self {
            domain,
            outcome: CheckOutcome::Warning,
            penalty,
            detail: detail.into(),
        }
    }
}

/// Immutable outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub intent_id: IntentId,
    pub verdict: Verdict,
    pub score: f64,
    pub triggered: Vec<Domain>,
    pub reason_code: ReasonCode,
    pub reason: String,
    pub policy_version: u32,
    pub checks: Vec<DomainCheck>,
}

impl PolicyDecision {
    pub fn is_authorized(&self) -> bool {
        self.verdict == Verdict::Authorize
    }
}
