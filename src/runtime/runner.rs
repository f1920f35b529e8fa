use serde::Serialize;
use std::future::Future;
use strum::Display;
use tokio::time::{Duration, MissedTickBehavior};

use crate::core::orchestrator::CycleOrchestrator;
use crate::error::CycleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    CycleBudget,
    Shutdown,
}

/// What a run of the cycle loop did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub mutations: u64,
    pub blocked: u64,
    pub aborted: u64,
    pub stop: Option<StopReason>,
}

/// Drive `orchestrator` every `interval` until the cycle budget is spent or
/// Ctrl-C arrives.
pub async fn run(
    orchestrator: &mut CycleOrchestrator,
    interval: Duration,
    max_cycles: Option<u64>,
) -> Result<RunSummary, CycleError> {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    run_until(orchestrator, interval, max_cycles, shutdown).await
}

/// Like [`run`], with an explicit shutdown signal.
///
/// Non-fatal cycle errors are logged and the loop carries on. A fatal one
/// ends the run and is returned.
pub async fn run_until<S>(
    orchestrator: &mut CycleOrchestrator,
    interval: Duration,
    max_cycles: Option<u64>,
    shutdown: S,
) -> Result<RunSummary, CycleError>
where
    S: Future<Output = ()>,
{
    let mut summary = RunSummary::default();
    if max_cycles == Some(0) {
        summary.stop = Some(StopReason::CycleBudget);
        return Ok(summary);
    }

    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(
        interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        max_cycles,
        "cycle loop starting"
    );

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!(cycles = summary.cycles, "shutdown requested, cycle loop stopping");
                summary.stop = Some(StopReason::Shutdown);
                break;
            }
            _ = ticker.tick() => {}
        }

        summary.cycles += 1;
        match orchestrator.run_cycle() {
            Ok(report) => {
                summary.mutations += u64::from(report.mutated());
                summary.blocked += u64::try_from(report.blocked().count()).unwrap_or(u64::MAX);
            }
            Err(error) if error.is_fatal() => {
                tracing::error!(cycles = summary.cycles, %error, "cycle loop stopped");
                return Err(error);
            }
            Err(error) => {
                summary.aborted += 1;
                tracing::warn!(%error, "cycle failed, continuing");
            }
        }

        if max_cycles.is_some_and(|budget| summary.cycles >= budget) {
            summary.stop = Some(StopReason::CycleBudget);
            break;
        }
    }

    Ok(summary)
}
