use std::collections::HashMap;
use std::sync::Arc;

use cyclegate::core::intent::{Command, IntentId, IntentManager, IntentStatus};
use cyclegate::core::state::{Mode, SystemState};
use cyclegate::security::PolicyGate;
use cyclegate::telemetry::{MemorySink, TelemetryEventKind, in_cycle_order};

use super::cycle_harness;

fn workload() -> Vec<Command> {
    vec![
        Command::AdjustOrbit { delta_v: 3.0 },
        Command::AdjustOrbit { delta_v: 9.0 },
        Command::SetMode { mode: Mode::LowPower },
        Command::AdjustOrbit { delta_v: -2.0 },
        Command::BatteryRecovery { charge: 10.0 },
        Command::SetMode { mode: Mode::Nominal },
        Command::ThermalRecovery { cooling: 5.0 },
        Command::AdjustOrbit { delta_v: 40.0 },
    ]
}

#[tokio::test]
async fn generation_advances_by_mutation_count() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = cycle_harness::orchestrator(SystemState::default(), sink);
    for command in workload() {
        orch.submit(command).unwrap();
    }

    let mut applied = 0;
    for _ in 0..12 {
        let report = orch.run_cycle().unwrap();
        let step = report.generation_after - report.generation_before;
        assert!(step <= 1);
        assert_eq!(step == 1, report.mutated());
        assert!(report.decisions.iter().filter(|d| d.is_authorized()).count() <= 1);
        assert!(in_cycle_order(&report.events));
        applied += step;
    }

    let applied_intents = orch
        .intents()
        .all()
        .filter(|intent| intent.status == IntentStatus::Applied)
        .count();
    assert_eq!(orch.snapshot().generation, applied);
    assert_eq!(usize::try_from(applied).unwrap(), applied_intents);
}

#[tokio::test]
async fn intent_is_never_deleted_and_never_regresses() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = cycle_harness::orchestrator(cycle_harness::with_battery(4.0), sink);
    for command in workload() {
        orch.submit(command).unwrap();
    }
    let submitted = orch.intents().len();

    let mut last_seen: HashMap<IntentId, IntentStatus> = HashMap::new();
    for _ in 0..10 {
        orch.run_cycle().unwrap();
        assert_eq!(orch.intents().len(), submitted);
        for intent in orch.intents().all() {
            if let Some(previous) = last_seen.get(&intent.id) {
                assert!(
                    !(previous.is_terminal() && *previous != intent.status),
                    "{} left terminal status {}",
                    intent.id,
                    previous
                );
                assert!(
                    !(*previous != IntentStatus::Pending && intent.status == IntentStatus::Pending),
                    "{} went back to pending",
                    intent.id
                );
            }
            last_seen.insert(intent.id, intent.status);
        }
    }
}

#[tokio::test]
async fn every_cycle_ends_with_latency_event() {
    let sink = Arc::new(MemorySink::new());
    let mut orch = cycle_harness::orchestrator(SystemState::default(), sink.clone());
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();
    for _ in 0..3 {
        let report = orch.run_cycle().unwrap();
        assert_eq!(
            report.events.last().map(|event| event.kind),
            Some(TelemetryEventKind::ExecutionLatency)
        );
    }

    cycle_harness::settle().await;
    let delivered = sink.events();
    let cycles: Vec<_> = delivered.iter().map(|event| event.cycle_id).collect();
    let mut sorted = cycles.clone();
    sorted.sort_unstable();
    assert_eq!(cycles, sorted);
    assert!(in_cycle_order(&delivered));
}

#[test]
fn evaluation_is_deterministic() {
    let mut intents = IntentManager::new();
    let intent = intents
        .submit(Command::AdjustOrbit { delta_v: 4.0 })
        .unwrap();
    let state = SystemState {
        battery_level: 9.0,
        temperature: 130.0,
        ..SystemState::default()
    };
    let gate = PolicyGate::default();

    let first = gate.evaluate(&intent, &state).unwrap();
    let second = gate.evaluate(&intent, &state).unwrap();
    assert_eq!(first, second);
}
