use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting.
///
/// The domain variants map directly onto how the bot answers the user:
/// `Validation` re-prompts, `Duplicate` ends the submission conversation,
/// the claim/rating variants become short callback alerts, and `Delivery`
/// is only ever logged or reported to the initiating actor — it never rolls
/// back a committed mutation.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Vote ledger (de)serialization errors
    #[error("Ledger encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad user input; recoverable by re-prompting
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Handle already listed or already pending review
    #[error("Duplicate handle: {0}")]
    Duplicate(String),

    /// Actor lacks the required privilege; no state was changed
    #[error("Not authorized")]
    Authorization,

    /// Another reviewer already holds the claim
    #[error("Already claimed by another reviewer")]
    AlreadyClaimed,

    /// Actor is not the claim holder of this submission
    #[error("Submission is claimed by a different reviewer")]
    NotClaimant,

    /// Voter already recorded this exact score; informational no-op
    #[error("Rating already recorded")]
    AlreadyRated,

    /// Referenced entity vanished (e.g. deleted between render and click)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Outbound message to an external recipient failed; always non-fatal
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
