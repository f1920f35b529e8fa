pub mod intent;
pub mod orchestrator;
pub mod state;
