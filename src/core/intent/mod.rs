mod command;
mod manager;
mod types;

pub use command::{Command, CommandKind};
pub use manager::IntentManager;
pub use types::{Intent, IntentId, IntentStatus};
