//! Database access: pool, schema, and the three table modules.

pub mod accounts;
pub mod db;
pub mod listings;
pub mod submissions;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
