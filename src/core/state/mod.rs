mod engine;
mod types;

pub use engine::{StateDelta, StateEngine, transition};
pub use types::{Domain, FieldChange, Mode, StateField, StateValue, SystemState};
