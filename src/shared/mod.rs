// Shared kernel: errors, configuration and cross-cutting utilities

pub mod config;
pub mod errors;
pub mod utils;

pub use config::EngineConfig;
pub use errors::{AppError, AppResult};
