pub mod logger;
pub mod serde_ttl;

pub use logger::{init_logger, LogContext, TimedOperation};
