use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::app::status::render_summary;
use crate::cli::commands::{Cli, Commands};
use cyclegate::Config;
use cyclegate::config::TelemetryBackend;
use cyclegate::core::intent::IntentManager;
use cyclegate::core::orchestrator::CycleOrchestrator;
use cyclegate::runtime;
use cyclegate::security::PolicyGate;
use cyclegate::telemetry::{ConfiguredSink, TelemetryEvent, TelemetryReporter, create_sink};

/// Print each broadcast event as one JSON line until the sink goes away.
async fn print_events(mut events: impl Stream<Item = TelemetryEvent> + Unpin) {
    while let Some(event) = events.next().await {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::warn!(%error, "unprintable telemetry event"),
        }
    }
}

/// Bootstrap the loop from `config`, queue `submissions` and run it.
///
/// Telemetry is drained before returning, even when the loop stopped on a
/// fatal error.
async fn run_loop(
    config: Config,
    cycles: Option<u64>,
    interval_ms: Option<u64>,
    submissions: &[String],
) -> Result<()> {
    let max_cycles = cycles.or(config.orchestrator.max_cycles);
    if config.telemetry.backend == TelemetryBackend::Memory && max_cycles.is_none() {
        anyhow::bail!(
            "telemetry.backend = \"memory\" retains every event; set --cycles or orchestrator.max_cycles"
        );
    }

    let ConfiguredSink {
        sink,
        memory,
        broadcast,
    } = create_sink(&config.telemetry);
    let printer = broadcast.map(|broadcast| tokio::spawn(print_events(broadcast.subscribe())));
    let (reporter, worker) = TelemetryReporter::spawn(Arc::clone(&sink), &config.telemetry);
    let mut orchestrator = CycleOrchestrator::from_config(&config, reporter);

    for raw in submissions {
        let id = orchestrator
            .submit_json(raw)
            .with_context(|| format!("rejected submission {raw}"))?;
        info!(intent_id = %id, "intent queued");
    }

    let interval = interval_ms.map_or_else(
        || config.orchestrator.cycle_interval(),
        Duration::from_millis,
    );
    info!(
        sink = sink.name(),
        policy_version = orchestrator.policy_handle().version(),
        "cyclegate starting"
    );

    let outcome = runtime::run(&mut orchestrator, interval, max_cycles).await;
    let state = orchestrator.snapshot();

    // Dropping the orchestrator closes the telemetry channel.
    drop(orchestrator);
    let telemetry = worker.await.context("telemetry worker failed")?;
    // Last sender gone, so the broadcast printer sees the end of the stream.
    drop(sink);
    if let Some(printer) = printer {
        printer.await.context("telemetry printer failed")?;
    }

    let summary = outcome?;
    println!("{}", render_summary(&config, &summary, &state, &telemetry));
    if let Some(memory) = memory {
        println!("retained       {} events", memory.len());
    }
    Ok(())
}

/// Gate decision for one command against the configured initial state.
fn evaluate(config: &Config, raw: &str) -> Result<()> {
    let mut intents = IntentManager::new();
    let intent = intents.submit_json(raw)?;
    let gate = PolicyGate::new(config.policy.clone());
    let decision = gate.evaluate(&intent, &config.state.to_state())?;
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run {
            cycles,
            interval_ms,
            submit,
        } => run_loop(config, cycles, interval_ms, &submit).await,

        Commands::Evaluate { command } => evaluate(&config, &command),

        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("# {}", config.config_path.display());
            println!("{rendered}");
            Ok(())
        }
    }
}
