use thiserror::Error;

use crate::core::intent::{IntentId, IntentStatus};

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `cyclegate`.
///
/// Each subsystem defines its own error variant. Drivers match on these to
/// decide whether the loop may continue; binary code uses `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CycleError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Intent ──────────────────────────────────────────────────────────
    #[error("intent: {0}")]
    Intent(#[from] IntentError),

    // ── Policy / Safety gate ────────────────────────────────────────────
    #[error("policy: {0}")]
    Policy(#[from] PolicyError),

    // ── State engine ────────────────────────────────────────────────────
    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    // ── Telemetry ───────────────────────────────────────────────────────
    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),

    // ── Orchestrator ────────────────────────────────────────────────────
    #[error("orchestrator halted after cycle {cycle_id}: {reason}")]
    Halted { cycle_id: u64, reason: String },

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CycleError {
    /// Whether the cycle loop must stop.
    ///
    /// Only invariant violations (and the halt they leave behind) are fatal;
    /// every other error leaves state untouched and the next cycle may run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Engine(EngineError::InvariantViolation { .. }) | Self::Halted { .. }
        )
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("policy version {offered} is not newer than active version {active}")]
    StalePolicyVersion { active: u32, offered: u32 },
}

// ─── Intent errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("unknown intent {0}")]
    UnknownIntent(IntentId),

    #[error("intent {id}: illegal transition {from} -> {to}")]
    IllegalTransition {
        id: IntentId,
        from: IntentStatus,
        to: IntentStatus,
    },
}

// ─── Policy errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid state: {0}")]
    InvalidState(String),
}

// ─── State engine errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invariant violation in cycle {cycle_id}: {message}")]
    InvariantViolation { cycle_id: u64, message: String },

    #[error("intent {id} is unreachable at the engine: {reason}")]
    UnreachableIntent { id: IntentId, reason: String },
}

// ─── Telemetry errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("sink {sink} unavailable: {message}")]
    SinkUnavailable { sink: String, message: String },

    #[error("sink {sink} timed out after {timeout_ms}ms")]
    SinkTimeout { sink: String, timeout_ms: u64 },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CycleError>;
