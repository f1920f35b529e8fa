pub mod runner;

pub use runner::{RunSummary, StopReason, run, run_until};
