//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod types;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::init_logger;
pub use types::{Category, RejectReason, Role, SubmissionStatus};
