use std::sync::Arc;

use cyclegate::config::PolicyConfig;
use cyclegate::core::intent::{Command, IntentStatus};
use cyclegate::core::state::{Domain, Mode, StateField, SystemState};
use cyclegate::security::{ReasonCode, Verdict};
use cyclegate::telemetry::{MemorySink, TelemetryEventKind, in_cycle_order};

use super::cycle_harness;

fn kinds(report: &cyclegate::CycleReport) -> Vec<TelemetryEventKind> {
    report.events.iter().map(|event| event.kind).collect()
}

#[tokio::test]
async fn battery_below_floor_blocks_orbit() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = cycle_harness::orchestrator(cycle_harness::with_battery(3.0), sink);
    let id = orch
        .submit_json(r#"{"type":"adjust_orbit","delta_v":1.0}"#)
        .unwrap();

    let report = orch.run_cycle().unwrap();

    let decision = &report.decisions[0];
    assert_eq!(decision.verdict, Verdict::Block);
    assert_eq!(decision.triggered, vec![Domain::Battery]);
    assert!(decision.reason.contains("battery"));
    assert_eq!(report.generation_after, report.generation_before);
    let kinds = kinds(&report);
    assert!(kinds.contains(&TelemetryEventKind::IntentBlocked));
    assert!(!kinds.contains(&TelemetryEventKind::StateUpdated));
    assert_eq!(orch.intents().get(id).unwrap().status, IntentStatus::Blocked);
}

#[tokio::test]
async fn healthy_mode_change_authorizes_with_single_change() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = cycle_harness::orchestrator(SystemState::default(), sink);
    orch.submit(Command::SetMode { mode: Mode::LowPower }).unwrap();

    let report = orch.run_cycle().unwrap();

    assert_eq!(report.decisions[0].reason_code, ReasonCode::ScoreAboveThreshold);
    let delta = report.delta.as_ref().unwrap();
    assert_eq!(delta.changes.len(), 1);
    assert_eq!(delta.changes[0].field, StateField::Mode);
    assert_eq!(report.generation_after, report.generation_before + 1);
    assert_eq!(
        kinds(&report),
        vec![
            TelemetryEventKind::IntentReceived,
            TelemetryEventKind::IntentAuthorized,
            TelemetryEventKind::StateUpdated,
            TelemetryEventKind::ExecutionLatency,
        ]
    );
    assert!(in_cycle_order(&report.events));
}

#[tokio::test]
async fn overheated_system_recovers_then_burns() {
    let sink = Arc::new(MemorySink::new());
    let initial = SystemState {
        temperature: 145.0,
        ..SystemState::default()
    };
    let mut orch = cycle_harness::orchestrator(initial, sink);
    let burn = orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();
    let cool = orch
        .submit(Command::ThermalRecovery { cooling: 40.0 })
        .unwrap();

    let first = orch.run_cycle().unwrap();
    assert!(first.decisions[0].triggered.contains(&Domain::Thermal));
    assert_eq!(first.delta.as_ref().unwrap().intent_id, cool);

    let second = orch.run_cycle().unwrap();
    assert_eq!(second.delta.as_ref().unwrap().intent_id, burn);
    assert_eq!(orch.intents().get(burn).unwrap().status, IntentStatus::Applied);
}

#[tokio::test]
async fn safe_mode_admits_only_recovery_and_mode_commands() {
    let sink = Arc::new(MemorySink::new());
    let initial = SystemState {
        mode: Mode::Safe,
        ..SystemState::default()
    };
    let mut orch = cycle_harness::orchestrator(initial, sink);
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();
    let leave_safe = orch.submit(Command::SetMode { mode: Mode::Nominal }).unwrap();

    let report = orch.run_cycle().unwrap();
    assert_eq!(report.decisions[0].triggered, vec![Domain::Mode]);
    assert_eq!(report.delta.unwrap().intent_id, leave_safe);

    let report = orch.run_cycle().unwrap();
    assert!(report.mutated());
    assert_eq!(orch.snapshot().mode, Mode::Nominal);
}

#[tokio::test]
async fn low_power_blocks_energy_intensive_commands() {
    let sink = Arc::new(MemorySink::new());
    let initial = SystemState {
        mode: Mode::LowPower,
        ..SystemState::default()
    };
    let mut orch = cycle_harness::orchestrator(initial, sink);
    orch.submit(Command::AdjustOrbit { delta_v: 0.5 }).unwrap();

    let report = orch.run_cycle().unwrap();
    assert_eq!(report.decisions[0].reason_code, ReasonCode::CriticalDomain);
    assert!(report.decisions[0].reason.contains("low_power"));
    assert!(!report.mutated());
}

#[tokio::test]
async fn projected_position_outside_bounds_blocks() {
    let sink = Arc::new(MemorySink::new());
    let initial = SystemState {
        position: 9.5,
        ..SystemState::default()
    };
    let mut orch = cycle_harness::orchestrator(initial, sink);
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();
    let back = orch.submit(Command::AdjustOrbit { delta_v: -1.0 }).unwrap();

    let report = orch.run_cycle().unwrap();
    assert_eq!(report.decisions[0].triggered, vec![Domain::Position]);
    assert_eq!(report.delta.unwrap().intent_id, back);
    assert!((orch.snapshot().position - 8.5).abs() < 1e-9);
}

#[tokio::test]
async fn narrowed_bounds_hold_orbit_changes_until_widened() {
    let sink = Arc::new(MemorySink::new());
    let initial = SystemState {
        position: 6.0,
        ..SystemState::default()
    };
    let mut orch = cycle_harness::orchestrator(initial, sink);
    orch.replace_policy(PolicyConfig {
        version: 2,
        position_min: -5.0,
        position_max: 5.0,
        ..PolicyConfig::default()
    })
    .unwrap();
    let correction = orch.submit(Command::AdjustOrbit { delta_v: -2.0 }).unwrap();

    let report = orch.run_cycle().unwrap();
    assert!(!report.mutated());
    assert_eq!(report.decisions[0].triggered, vec![Domain::Position]);
    assert!(report.decisions[0].reason.contains("position 6.00 outside"));
    assert_eq!(orch.intents().get(correction).unwrap().status, IntentStatus::Blocked);

    orch.replace_policy(PolicyConfig {
        version: 3,
        ..PolicyConfig::default()
    })
    .unwrap();
    let report = orch.run_cycle().unwrap();
    assert_eq!(report.delta.unwrap().intent_id, correction);
    assert!((orch.snapshot().position - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn stacked_warnings_fall_below_threshold() {
    let sink = Arc::new(MemorySink::new());
    let initial = SystemState {
        battery_level: 8.0,
        temperature: 125.0,
        ..SystemState::default()
    };
    let mut orch = cycle_harness::orchestrator(initial, sink);
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();

    let report = orch.run_cycle().unwrap();
    let decision = &report.decisions[0];
    assert_eq!(decision.reason_code, ReasonCode::BelowThreshold);
    assert!((decision.score - 40.0).abs() < f64::EPSILON);
    assert_eq!(decision.triggered, vec![Domain::Battery, Domain::Thermal]);
}

#[tokio::test]
async fn single_warning_still_authorizes() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = cycle_harness::orchestrator(cycle_harness::with_battery(8.0), sink);
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();

    let report = orch.run_cycle().unwrap();
    let decision = report.authorized().unwrap();
    assert!((decision.score - 70.0).abs() < f64::EPSILON);
    assert_eq!(decision.triggered, vec![Domain::Battery]);
    assert!(report.mutated());
}
