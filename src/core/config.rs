use once_cell::sync::Lazy;
use std::env;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable.
/// An empty token is fatal at launch (checked in main before the bot starts).
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Owner account id
/// Read from OWNER_ID environment variable. 0 means "not configured";
/// owner-only commands are then unavailable.
pub static OWNER_ID: Lazy<i64> = Lazy::new(|| {
    env::var("OWNER_ID").ok().and_then(|s| s.trim().parse().ok()).unwrap_or(0)
});

/// Public channel where approved listings are posted
/// Read from CHANNEL_ID environment variable (e.g. -1001234567890).
/// When unset, approvals still succeed but nothing is published.
pub static CHANNEL_ID: Lazy<Option<i64>> =
    Lazy::new(|| env::var("CHANNEL_ID").ok().and_then(|s| s.trim().parse().ok()));

fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split([',', ' ', '\n', '\t'])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

/// Sudo account ids (comma-separated)
/// Read from SUDO_USERS environment variable. The owner is always included.
/// These accounts are privileged regardless of their role column in the
/// database; the database only adds moderators on top.
pub static SUDO_USERS: Lazy<Vec<i64>> = Lazy::new(|| {
    let mut ids = env::var("SUDO_USERS")
        .ok()
        .map(|raw| parse_id_list(&raw))
        .unwrap_or_default();
    if *OWNER_ID != 0 && !ids.contains(&OWNER_ID) {
        ids.push(*OWNER_ID);
    }
    ids
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: botlibrary.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "botlibrary.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: botlibrary.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "botlibrary.log".to_string()));

/// Returns true when the id belongs to the startup-configured sudo set.
pub fn is_configured_sudo(account_id: i64) -> bool {
    SUDO_USERS.contains(&account_id)
}

/// Health endpoint configuration
pub mod health {
    use once_cell::sync::Lazy;
    use std::env;

    /// Port for the liveness HTTP server
    /// Read from HEALTH_PORT (or PORT, for platforms that inject it)
    /// Default: 8080
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        env::var("HEALTH_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080)
    });
}

/// Catalog display configuration
pub mod catalog {
    /// Listings per page in /list output
    pub const PAGE_SIZE: i64 = 15;

    /// Entries shown in the "Top Rated" view
    pub const TOP_LIMIT: i64 = 10;

    /// Maximum results returned by /search
    pub const SEARCH_LIMIT: i64 = 5;

    /// Listings shown per category browse view
    pub const CATEGORY_LIMIT: i64 = 15;

    /// Pending submissions shown by /pending
    pub const PENDING_LIMIT: i64 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_list_handles_mixed_separators() {
        assert_eq!(parse_id_list("1,2 3\n4"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn parse_id_list_skips_garbage() {
        assert_eq!(parse_id_list("10,abc, 20,"), vec![10, 20]);
    }

    #[test]
    fn parse_id_list_empty() {
        assert!(parse_id_list("").is_empty());
    }
}
