pub mod schema;

pub use schema::{
    Config, InitialStateConfig, OrchestratorConfig, PolicyConfig, TelemetryBackend,
    TelemetryConfig, load_from_path,
};
