use cyclegate::Config;
use cyclegate::core::state::SystemState;
use cyclegate::runtime::RunSummary;
use cyclegate::telemetry::TelemetryStats;

/// Human-readable end-of-run summary.
pub fn render_summary(
    config: &Config,
    summary: &RunSummary,
    state: &SystemState,
    telemetry: &TelemetryStats,
) -> String {
    let stop = summary
        .stop
        .map_or_else(|| "error".to_string(), |reason| reason.to_string());

    let lines = [
        "◆ cyclegate run".to_string(),
        String::new(),
        format!("version        {}", env!("CARGO_PKG_VERSION")),
        format!("config         {}", config.config_path.display()),
        format!("policy         v{}", config.policy.version),
        String::new(),
        format!("cycles         {} (stopped: {stop})", summary.cycles),
        format!("mutations      {}", summary.mutations),
        format!("blocked        {}", summary.blocked),
        format!("aborted        {}", summary.aborted),
        String::new(),
        format!("generation     {}", state.generation),
        format!("position       {:.2}", state.position),
        format!("battery        {:.1}", state.battery_level),
        format!("temperature    {:.1}", state.temperature),
        format!("mode           {}", state.mode),
        String::new(),
        format!(
            "telemetry      {} (queued {}, delivered {}, delayed {}, dropped {}, sink failures {})",
            config.telemetry.backend,
            telemetry.queued,
            telemetry.delivered,
            telemetry.delayed,
            telemetry.dropped,
            telemetry.sink_failures
        ),
    ];
    lines.join("\n")
}
