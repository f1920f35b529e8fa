mod broadcast;
mod factory;
pub mod log;
mod memory;
mod noop;
pub mod traits;

pub use self::log::LogSink;
pub use broadcast::BroadcastSink;
pub use factory::{ConfiguredSink, create_sink};
pub use memory::MemorySink;
pub use noop::NoopSink;
pub use traits::{DeliveryFuture, TelemetrySink};
