//! BotLibrary - community bot directory running as a Telegram bot
//!
//! Users submit third-party bots through a guided conversation, privileged
//! accounts review them through a claim/approve/reject protocol, and
//! approved bots land in a public channel with a star-rating keyboard.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, domain enums, health endpoint
//! - `storage`: SQLite pool, schema, and the account/submission/listing tables
//! - `telegram`: dispatcher schema, conversation workflow, and handlers

#![allow(clippy::too_many_arguments)]

pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
pub use telegram::{create_bot, schema, setup_bot_commands};
