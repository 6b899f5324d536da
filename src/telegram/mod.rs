//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod browse;
pub mod callback;
pub mod format;
pub mod moderation;
pub mod rating;
pub mod schema;
pub mod submission;

use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use submission::SubmitState;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for handlers
pub type HandlerResult = Result<(), HandlerError>;

/// Per-chat handle to the submission conversation state
pub type SubmitDialogue = Dialogue<SubmitState, InMemStorage<SubmitState>>;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use callback::CallbackAction;
pub use schema::schema;
