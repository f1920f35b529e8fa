use std::collections::HashSet;

use cyclegate::core::intent::Command;
use cyclegate::core::state::SystemState;
use cyclegate::telemetry::{BroadcastSink, Delivery, TelemetryEventKind, TelemetryReporter};
use tokio_stream::StreamExt;

use super::cycle_harness::{self, FlakySink};

#[tokio::test]
async fn sink_outage_delays_but_does_not_stall_the_loop() {
    let sink = FlakySink::new();
    let mut orch = cycle_harness::orchestrator(SystemState::default(), sink.clone());
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();

    sink.set_offline(true);
    let report = orch.run_cycle().unwrap();
    assert!(report.mutated());
    assert_eq!(orch.snapshot().generation, 1);
    cycle_harness::settle().await;
    assert!(sink.delivered().is_empty());
    assert!(sink.attempts() >= 1);

    sink.set_offline(false);
    orch.run_cycle().unwrap();
    cycle_harness::settle().await;

    let delivered = sink.delivered();
    let first_cycle: Vec<_> = delivered.iter().filter(|e| e.cycle_id == 1).collect();
    assert!(first_cycle.iter().all(|e| e.delivery == Delivery::Delayed));
    let notices = first_cycle
        .iter()
        .filter(|e| e.kind == TelemetryEventKind::TelemetryDelayed)
        .count();
    assert_eq!(notices, 1);
    assert_eq!(
        first_cycle.last().map(|e| e.kind),
        Some(TelemetryEventKind::TelemetryDelayed)
    );

    // received, authorized, state_updated, latency + notice
    assert_eq!(first_cycle.len(), 5);
    let second_cycle: Vec<_> = delivered.iter().filter(|e| e.cycle_id == 2).collect();
    assert!(second_cycle.iter().all(|e| e.delivery == Delivery::Immediate));

    let ids: HashSet<_> = delivered.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), delivered.len(), "an event was delivered twice");

    let stats = orch.telemetry_stats();
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.delayed, 4);
}

#[tokio::test]
async fn broadcast_subscribers_observe_delivered_events() {
    let broadcast = BroadcastSink::new(64);
    let mut stream = broadcast.subscribe();
    let (reporter, _worker) = TelemetryReporter::spawn(
        std::sync::Arc::new(broadcast.clone()),
        &cycle_harness::fast_telemetry(),
    );
    let mut orch = cyclegate::CycleOrchestrator::new(
        SystemState::default(),
        cyclegate::security::PolicyHandle::new(cyclegate::config::PolicyConfig::default()),
        reporter,
    );
    orch.submit(Command::BatteryRecovery { charge: 1.0 }).unwrap();
    orch.run_cycle().unwrap();

    let mut kinds = Vec::new();
    for _ in 0..4 {
        let event = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![
            TelemetryEventKind::IntentReceived,
            TelemetryEventKind::IntentAuthorized,
            TelemetryEventKind::StateUpdated,
            TelemetryEventKind::ExecutionLatency,
        ]
    );
    assert_eq!(orch.snapshot().generation, 1);
}
