//! Account rows and authorization checks.

use rusqlite::{params, Connection, OptionalExtension};

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::types::Role;

/// An account row from the database.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: i64,
    pub username: Option<String>,
    pub role: Role,
    pub joined_at: String,
}

fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        account_id: row.get(0)?,
        username: row.get(1)?,
        role: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

/// Create the account on first contact, or refresh its username.
///
/// Never downgrades the role column; the row is created with the default
/// `user` role and promotions only happen through `set_role`.
pub fn ensure_account(conn: &Connection, account_id: i64, username: Option<&str>) -> AppResult<()> {
    conn.execute(
        "INSERT INTO accounts (account_id, username) VALUES (?1, ?2)
         ON CONFLICT(account_id) DO UPDATE SET
           username = COALESCE(excluded.username, username)",
        params![account_id, username],
    )?;
    Ok(())
}

/// Get an account by id.
pub fn get_account(conn: &Connection, account_id: i64) -> AppResult<Option<Account>> {
    conn.query_row(
        "SELECT account_id, username, role, joined_at FROM accounts WHERE account_id = ?1",
        params![account_id],
        parse_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Set an account's role, creating the row when the account is unknown.
pub fn set_role(conn: &Connection, account_id: i64, role: Role) -> AppResult<()> {
    conn.execute(
        "INSERT INTO accounts (account_id, role) VALUES (?1, ?2)
         ON CONFLICT(account_id) DO UPDATE SET role = excluded.role",
        params![account_id, role],
    )?;
    Ok(())
}

/// Demote an account back to `user`, but only if it currently holds `from`.
/// Returns true when a row was changed.
pub fn demote_if_role(conn: &Connection, account_id: i64, from: Role) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE accounts SET role = 'user' WHERE account_id = ?1 AND role = ?2",
        params![account_id, from],
    )?;
    Ok(changed > 0)
}

/// All known account ids (broadcast recipients).
pub fn all_account_ids(conn: &Connection) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT account_id FROM accounts")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Account ids with a privileged role column (moderation notification targets).
pub fn privileged_account_ids(conn: &Connection) -> AppResult<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT account_id FROM accounts WHERE role IN ('owner', 'sudo', 'moderator')")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Total number of known accounts.
pub fn account_count(conn: &Connection) -> AppResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
        .map_err(Into::into)
}

/// Whether the actor may run moderation/admin actions.
///
/// The startup-configured sudo set always wins; the database role column
/// covers moderators promoted at runtime. Either source grants access.
pub fn is_privileged(conn: &Connection, account_id: i64) -> bool {
    if config::is_configured_sudo(account_id) {
        return true;
    }
    match get_account(conn, account_id) {
        Ok(Some(account)) => account.role.is_privileged(),
        Ok(None) => false,
        Err(e) => {
            log::error!("Privilege check failed for {}: {}", account_id, e);
            false
        }
    }
}
