use std::sync::Arc;

use cyclegate::config::PolicyConfig;
use cyclegate::core::intent::Command;
use cyclegate::core::state::SystemState;
use cyclegate::error::{ConfigError, CycleError};
use cyclegate::security::ReasonCode;
use cyclegate::telemetry::NoopSink;

use super::cycle_harness;

#[tokio::test]
async fn operator_task_flips_lock_between_cycles() {
    let mut orch = cycle_harness::orchestrator(SystemState::default(), Arc::new(NoopSink));
    let handle = orch.policy_handle();

    tokio::spawn(async move {
        handle
            .replace(PolicyConfig {
                version: 2,
                lock: true,
                ..PolicyConfig::default()
            })
            .unwrap();
    })
    .await
    .unwrap();

    orch.submit(Command::BatteryRecovery { charge: 2.0 }).unwrap();
    let report = orch.run_cycle().unwrap();
    assert_eq!(report.decisions[0].reason_code, ReasonCode::Locked);
    assert!(!report.mutated());

    orch.replace_policy(PolicyConfig {
        version: 3,
        ..PolicyConfig::default()
    })
    .unwrap();
    let report = orch.run_cycle().unwrap();
    assert!(report.mutated());
    assert_eq!(report.decisions[0].policy_version, 3);
}

#[tokio::test]
async fn override_authorizes_below_threshold_but_not_critical() {
    let mut orch = cycle_harness::orchestrator(
        SystemState {
            battery_level: 8.0,
            temperature: 125.0,
            ..SystemState::default()
        },
        Arc::new(NoopSink),
    );
    orch.replace_policy(PolicyConfig {
        version: 2,
        override_authorize: true,
        ..PolicyConfig::default()
    })
    .unwrap();

    orch.submit(Command::AdjustOrbit { delta_v: 50.0 }).unwrap();
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();
    let report = orch.run_cycle().unwrap();

    // Projected position 50 is critical; override does not help.
    assert_eq!(report.decisions[0].reason_code, ReasonCode::CriticalDomain);
    assert_eq!(report.decisions[1].reason_code, ReasonCode::Override);
    assert!(report.mutated());
}

#[tokio::test]
async fn stale_or_invalid_policy_is_refused() {
    let orch = cycle_harness::orchestrator(SystemState::default(), Arc::new(NoopSink));

    let stale = orch.replace_policy(PolicyConfig::default()).unwrap_err();
    assert!(matches!(
        stale,
        CycleError::Config(ConfigError::StalePolicyVersion {
            active: 1,
            offered: 1
        })
    ));

    let invalid = orch
        .replace_policy(PolicyConfig {
            version: 2,
            battery_floor: 50.0,
            battery_warning: 10.0,
            ..PolicyConfig::default()
        })
        .unwrap_err();
    assert!(matches!(invalid, CycleError::Config(ConfigError::Validation(_))));
    assert_eq!(orch.policy_handle().version(), 1);
}
