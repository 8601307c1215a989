pub mod config;
pub mod errors;
pub mod types;

pub use config::EngineConfig;
pub use errors::{AppError, AppResult, DomainError};
pub use types::*;
