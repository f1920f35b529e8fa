mod handle;
mod types;

pub use handle::PolicyHandle;
pub use types::{CheckOutcome, DomainCheck, PolicyDecision, ReasonCode, Verdict};

use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::core::intent::{Command, Intent};
use crate::core::state::{Domain, Mode, SystemState};
use crate::error::PolicyError;

const SCORE_MAX: f64 = 100.0;

/// Safety gate over one policy configuration snapshot.
///
/// [`PolicyGate::evaluate`] is a pure function of the intent, the state and
/// the snapshot: the same inputs always produce the same decision.
#[derive(Debug, Clone)]
pub struct PolicyGate {
    config: Arc<PolicyConfig>,
}

impl Default for PolicyGate {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

impl PolicyGate {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn from_shared(config: Arc<PolicyConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        intent: &Intent,
        state: &SystemState,
    ) -> Result<PolicyDecision, PolicyError> {
        check_state(state)?;

        let checks = self.domain_checks(&intent.command, state);
        let penalty: f64 = checks.iter().map(|check| check.penalty).sum();
        let score = (SCORE_MAX - penalty).clamp(0.0, SCORE_MAX);

        let mut triggered: Vec<Domain> = checks
            .iter()
            .filter(|check| check.outcome != CheckOutcome::Pass)
            .map(|check| check.domain)
            .collect();
        triggered.sort();
        triggered.dedup();

        let critical: Vec<&DomainCheck> = checks
            .iter()
            .filter(|check| check.outcome == CheckOutcome::Critical)
            .collect();

        let cfg = &self.config;
        let threshold = cfg.authorization_threshold;
        let override_note = if cfg.override_authorize {
            "; operator override active"
        } else {
            ""
        };

        let (verdict, reason_code, reason) = if cfg.lock {
            (
                Verdict::Block,
                ReasonCode::Locked,
                format!("locked: operator lock active (score {score:.1}){override_note}"),
            )
        } else if !critical.is_empty() {
            let domains: Vec<String> = critical.iter().map(|c| c.domain.to_string()).collect();
            let details: Vec<&str> = critical.iter().map(|c| c.detail.as_str()).collect();
            (
                Verdict::Block,
                ReasonCode::CriticalDomain,
                format!(
                    "critical domain {}: {}{override_note}",
                    domains.join(","),
                    details.join("; ")
                ),
            )
        } else if score >= threshold {
            (
                Verdict::Authorize,
                ReasonCode::ScoreAboveThreshold,
                format!("score {score:.1} >= threshold {threshold:.1}{override_note}"),
            )
        } else if cfg.override_authorize {
            (
                Verdict::Authorize,
                ReasonCode::Override,
                format!(
                    "override: operator authorized at score {score:.1} below threshold {threshold:.1}"
                ),
            )
        } else {
            (
                Verdict::Block,
                ReasonCode::BelowThreshold,
                format!("score {score:.1} < threshold {threshold:.1}"),
            )
        };

        tracing::debug!(
            intent_id = %intent.id,
            verdict = %verdict,
            reason_code = %reason_code,
            score,
            "policy evaluated"
        );

        Ok(PolicyDecision {
            intent_id: intent.id,
            verdict,
            score,
            triggered,
            reason_code,
            reason,
            policy_version: cfg.version,
            checks,
        })
    }

    fn domain_checks(&self, command: &Command, state: &SystemState) -> Vec<DomainCheck> {
        let cfg = &self.config;
        let affected = command.affected_domains();
        let recovers = command.recovers();
        let guards = |domain: Domain| affected.contains(&domain) && recovers != Some(domain);

        let mut checks = Vec::new();

        if guards(Domain::Battery) {
            let level = state.battery_level;
            if level < cfg.battery_floor {
                checks.push(DomainCheck::critical(
                    Domain::Battery,
                    format!("battery_level {level:.1} below floor {:.1}", cfg.battery_floor),
                ));
            } else if level < cfg.battery_warning {
                checks.push(DomainCheck::warning(
                    Domain::Battery,
                    cfg.warning_penalty,
                    format!(
                        "battery_level {level:.1} below warning {:.1}",
                        cfg.battery_warning
                    ),
                ));
            }
        }

        if guards(Domain::Thermal) {
            let temperature = state.temperature;
            if temperature > cfg.temperature_ceiling {
                checks.push(DomainCheck::critical(
                    Domain::Thermal,
                    format!(
                        "temperature {temperature:.1} above ceiling {:.1}",
                        cfg.temperature_ceiling
                    ),
                ));
            } else if temperature > cfg.temperature_warning {
                checks.push(DomainCheck::warning(
                    Domain::Thermal,
                    cfg.warning_penalty,
                    format!(
                        "temperature {temperature:.1} above warning {:.1}",
                        cfg.temperature_warning
                    ),
                ));
            }
        }

        if guards(Domain::Position) {
            let (min, max) = (cfg.position_min, cfg.position_max);
            let position = state.position;
            if position < min || position > max {
                checks.push(DomainCheck::critical(
                    Domain::Position,
                    format!("position {position:.2} outside [{min:.2}, {max:.2}]"),
                ));
            } else if let Command::AdjustOrbit { delta_v } = *command {
                let projected = position + delta_v;
                if projected < min || projected > max {
                    checks.push(DomainCheck::critical(
                        Domain::Position,
                        format!("projected position {projected:.2} outside [{min:.2}, {max:.2}]"),
                    ));
                }
            }
        }

        match state.mode {
            Mode::Safe if !command.is_recovery() && !matches!(command, Command::SetMode { .. }) => {
                checks.push(DomainCheck::critical(
                    Domain::Mode,
                    format!("safe mode admits only recovery or mode commands, got {}", command.kind()),
                ));
            }
            Mode::LowPower if command.is_energy_intensive() => {
                checks.push(DomainCheck::critical(
                    Domain::Mode,
                    format!("low_power mode blocks energy-intensive {}", command.kind()),
                ));
            }
            Mode::LowPower if !command.is_recovery() => {
                checks.push(DomainCheck::warning(
                    Domain::Mode,
                    cfg.low_power_penalty,
                    format!("low_power mode penalizes {}", command.kind()),
                ));
            }
            _ => {}
        }

        checks
    }
}

fn check_state(state: &SystemState) -> Result<(), PolicyError> {
    let scalars = [
        ("position", state.position),
        ("battery_level", state.battery_level),
        ("temperature", state.temperature),
    ];
    for (field, value) in scalars {
        if !value.is_finite() {
            return Err(PolicyError::InvalidState(format!("{field} is not finite")));
        }
    }
    if !(0.0..=100.0).contains(&state.battery_level) {
        return Err(PolicyError::InvalidState(format!(
            "battery_level {} outside [0, 100]",
            state.battery_level
        )));
    }
    Ok(())
}
