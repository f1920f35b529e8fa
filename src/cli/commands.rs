use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `cyclegate` - intent-driven control loop with a policy gate.
#[derive(Parser, Debug)]
#[command(name = "cyclegate")]
#[command(version = "0.1.0")]
#[command(about = "Run intents through a safety gate, one state mutation per cycle.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.cyclegate/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the cycle loop
    Run {
        /// Stop after this many cycles (default: orchestrator.max_cycles, else until Ctrl-C)
        #[arg(long)]
        cycles: Option<u64>,

        /// Time between cycles in milliseconds (default: orchestrator.cycle_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Command to submit before the first cycle, as JSON; repeatable
        #[arg(long = "submit", value_name = "JSON")]
        submit: Vec<String>,
    },

    /// Dry-run the gate for one command against the configured initial state
    Evaluate {
        /// Command as JSON, e.g. '{"type":"adjust_orbit","delta_v":1.5}'
        #[arg(long, value_name = "JSON")]
        command: String,
    },

    /// Print the effective configuration as TOML
    Config,
}
