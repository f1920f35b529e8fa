mod core;
mod orchestrator;
mod policy;
mod state;
mod telemetry;

pub use self::core::{Config, load_from_path};
pub use orchestrator::OrchestratorConfig;
pub use policy::PolicyConfig;
pub use state::InitialStateConfig;
pub use telemetry::{TelemetryBackend, TelemetryConfig};
