use std::fs;
use std::sync::Arc;

use cyclegate::config::{TelemetryBackend, load_from_path};
use cyclegate::core::intent::Command;
use cyclegate::core::orchestrator::CycleOrchestrator;
use cyclegate::core::state::{Domain, Mode};
use cyclegate::telemetry::{TelemetryReporter, create_sink};
use tempfile::TempDir;

const CONFIG: &str = r#"
[state]
battery_level = 4.0
mode = "low_power"

[policy]
version = 7
authorization_threshold = 60.0

[telemetry]
backend = "memory"
retry_interval_ms = 10

[orchestrator]
intent_ttl_secs = 3600
max_cycles = 5
"#;

#[tokio::test]
async fn orchestrator_bootstraps_from_toml() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, CONFIG).unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.config_path, path);
    assert_eq!(config.state.mode, Mode::LowPower);
    assert_eq!(config.telemetry.backend, TelemetryBackend::Memory);
    assert_eq!(config.orchestrator.max_cycles, Some(5));

    let configured = create_sink(&config.telemetry);
    let memory = configured.memory.clone().unwrap();
    let (reporter, _worker) = TelemetryReporter::spawn(Arc::clone(&configured.sink), &config.telemetry);
    let mut orch = CycleOrchestrator::from_config(&config, reporter);
    assert_eq!(orch.policy_handle().version(), 7);

    orch.submit(Command::BatteryRecovery { charge: 20.0 }).unwrap();
    orch.submit(Command::AdjustOrbit { delta_v: 1.0 }).unwrap();
    let report = orch.run_cycle().unwrap();

    // Orbit is still blocked by low power; recovery goes through.
    assert!((orch.snapshot().battery_level - 24.0).abs() < f64::EPSILON);
    assert_eq!(report.decisions.len(), 1);
    assert!(report.decisions[0].is_authorized());

    let report = orch.run_cycle().unwrap();
    assert!(report.decisions[0].triggered.contains(&Domain::Mode));
    assert!(report.expired.is_empty());

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!memory.is_empty());
}

#[test]
fn invalid_thresholds_are_rejected_with_key_name() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[policy]\nposition_min = 5.0\nposition_max = -5.0\n").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("policy.position_min"));
}

#[test]
fn unknown_backend_fails_to_parse() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[telemetry]\nbackend = \"kafka\"\n").unwrap();

    assert!(load_from_path(&path).is_err());
}
