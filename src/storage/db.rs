//! Connection pool and schema management.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;

use crate::core::error::AppResult;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and ensures the
/// schema exists before the pool is handed out. Every connection enables
/// foreign keys and a generous busy timeout so concurrent handlers queue on
/// SQLite's write lock instead of erroring out.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(30))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    });
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    init_schema(&conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Create all tables and indexes if they do not exist yet.
///
/// The partial unique index on open submissions backs the
/// one-open-submission-per-handle rule at the storage level, so two
/// concurrent submitters cannot slip past the application-level check.
///
/// Exposed for tests that run against `Connection::open_in_memory()`.
#[doc(hidden)]
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            account_id INTEGER PRIMARY KEY,
            username   TEXT,
            role       TEXT NOT NULL DEFAULT 'user',
            joined_at  DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS submissions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            handle           TEXT NOT NULL,
            description      TEXT NOT NULL,
            features         TEXT NOT NULL,
            category         TEXT NOT NULL,
            submitted_by     INTEGER NOT NULL REFERENCES accounts(account_id),
            submitted_at     DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            status           TEXT NOT NULL DEFAULT 'pending',
            rejection_reason TEXT,
            claimed_by       INTEGER REFERENCES accounts(account_id),
            claimed_at       DATETIME
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_submissions_open_handle
            ON submissions(handle) WHERE status IN ('pending', 'under_review');

        CREATE TABLE IF NOT EXISTS listings (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            submission_id      INTEGER NOT NULL REFERENCES submissions(id),
            handle             TEXT NOT NULL UNIQUE,
            description        TEXT NOT NULL,
            features           TEXT NOT NULL,
            category           TEXT NOT NULL,
            rating             REAL NOT NULL DEFAULT 0.0,
            vote_count         INTEGER NOT NULL DEFAULT 0,
            votes              TEXT NOT NULL DEFAULT '{}',
            submitted_by       INTEGER NOT NULL REFERENCES accounts(account_id),
            approved_by        INTEGER NOT NULL REFERENCES accounts(account_id),
            submitted_at       DATETIME NOT NULL,
            approved_at        DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            channel_message_id INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category);
        CREATE INDEX IF NOT EXISTS idx_listings_rating ON listings(rating DESC);",
    )
}
