//! Listing rows, the vote ledger, and catalog queries.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::core::error::{AppError, AppResult};
use crate::core::types::Category;

/// A published directory entry.
///
/// `votes` is the authoritative ledger (voter id → latest 1–5 score);
/// `rating` and `vote_count` are denormalized from it on every vote so
/// catalog queries can sort without decoding JSON.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: i64,
    pub submission_id: i64,
    pub handle: String,
    pub description: String,
    pub features: String,
    pub category: Category,
    pub rating: f64,
    pub vote_count: i64,
    pub votes: BTreeMap<i64, u8>,
    pub submitted_by: i64,
    pub approved_by: i64,
    pub submitted_at: String,
    pub approved_at: String,
    pub channel_message_id: Option<i32>,
}

/// What a vote did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote from this account
    First,
    /// Existing entry replaced with a different score
    Changed,
}

fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Listing> {
    let votes_json: String = row.get(8)?;
    let votes: BTreeMap<i64, u8> = serde_json::from_str(&votes_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Listing {
        id: row.get(0)?,
        submission_id: row.get(1)?,
        handle: row.get(2)?,
        description: row.get(3)?,
        features: row.get(4)?,
        category: row.get(5)?,
        rating: row.get(6)?,
        vote_count: row.get(7)?,
        votes,
        submitted_by: row.get(9)?,
        approved_by: row.get(10)?,
        submitted_at: row.get(11)?,
        approved_at: row.get(12)?,
        channel_message_id: row.get(13)?,
    })
}

const SELECT_COLUMNS: &str = "id, submission_id, handle, description, features, category, rating,
     vote_count, votes, submitted_by, approved_by, submitted_at, approved_at, channel_message_id";

/// Round a mean score to one decimal, half away from zero.
///
/// Scores are non-negative, so this is plain round-half-up: 3.25 → 3.3,
/// 3.35 → 3.4. Applied in exactly this one place so every rating in the
/// system rounds the same way.
pub fn round_rating(mean: f64) -> f64 {
    (mean * 10.0).round() / 10.0
}

/// Get a listing by id.
pub fn get_listing(conn: &Connection, id: i64) -> AppResult<Option<Listing>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM listings WHERE id = ?1"),
        params![id],
        parse_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Get a listing by its unique handle.
pub fn get_listing_by_handle(conn: &Connection, handle: &str) -> AppResult<Option<Listing>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM listings WHERE handle = ?1"),
        params![handle],
        parse_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Record where the listing was published so votes can re-render the post
/// and deletion can clean it up.
pub fn set_channel_message_id(conn: &Connection, id: i64, message_id: i32) -> AppResult<()> {
    conn.execute(
        "UPDATE listings SET channel_message_id = ?2 WHERE id = ?1",
        params![id, message_id],
    )?;
    Ok(())
}

/// Record a vote and recompute the denormalized aggregates.
///
/// The ledger read-modify-write runs in one immediate transaction, so two
/// simultaneous voters serialize instead of losing an update. Re-voting the
/// same score is reported as `AlreadyRated` and persists nothing; a
/// different score replaces the voter's entry.
pub fn record_vote(conn: &mut Connection, listing_id: i64, voter: i64, score: u8) -> AppResult<(Listing, VoteOutcome)> {
    if !(1..=5).contains(&score) {
        return Err(AppError::Validation(format!("score {score} is out of range 1-5")));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let votes_json: Option<String> = tx
        .query_row(
            "SELECT votes FROM listings WHERE id = ?1",
            params![listing_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(votes_json) = votes_json else {
        return Err(AppError::NotFound(format!("listing #{listing_id} no longer exists")));
    };

    let mut votes: BTreeMap<i64, u8> = serde_json::from_str(&votes_json)?;
    let outcome = match votes.insert(voter, score) {
        Some(previous) if previous == score => return Err(AppError::AlreadyRated),
        Some(_) => VoteOutcome::Changed,
        None => VoteOutcome::First,
    };

    let count = votes.len() as i64;
    let total: i64 = votes.values().map(|&s| i64::from(s)).sum();
    let rating = round_rating(total as f64 / count as f64);

    tx.execute(
        "UPDATE listings SET votes = ?2, vote_count = ?3, rating = ?4 WHERE id = ?1",
        params![listing_id, serde_json::to_string(&votes)?, count, rating],
    )?;
    let listing = tx.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM listings WHERE id = ?1"),
        params![listing_id],
        parse_row,
    )?;
    tx.commit()?;

    Ok((listing, outcome))
}

/// Delete a listing, its originating submission, and return the removed row.
///
/// The caller is responsible for removing the public channel post afterwards;
/// the database mutation commits first.
pub fn delete_listing_by_handle(conn: &mut Connection, handle: &str) -> AppResult<Listing> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let listing = tx
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM listings WHERE handle = ?1"),
            params![handle],
            parse_row,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("{handle} is not in the library")))?;

    tx.execute("DELETE FROM listings WHERE id = ?1", params![listing.id])?;
    tx.execute("DELETE FROM submissions WHERE id = ?1", params![listing.submission_id])?;
    tx.commit()?;

    Ok(listing)
}

/// Best-rated listings first.
pub fn top_rated(conn: &Connection, limit: i64) -> AppResult<Vec<Listing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM listings ORDER BY rating DESC, vote_count DESC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], parse_row)?;
    let mut listings = Vec::new();
    for row in rows {
        listings.push(row?);
    }
    Ok(listings)
}

/// Listings in one category, best-rated first.
pub fn listings_by_category(conn: &Connection, category: Category, limit: i64) -> AppResult<Vec<Listing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM listings WHERE category = ?1
         ORDER BY rating DESC, vote_count DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![category, limit], parse_row)?;
    let mut listings = Vec::new();
    for row in rows {
        listings.push(row?);
    }
    Ok(listings)
}

/// One page of the catalog, best-rated first.
pub fn listings_page(conn: &Connection, offset: i64, limit: i64) -> AppResult<Vec<Listing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM listings ORDER BY rating DESC, vote_count DESC, id ASC
         LIMIT ?2 OFFSET ?1"
    ))?;
    let rows = stmt.query_map(params![offset, limit], parse_row)?;
    let mut listings = Vec::new();
    for row in rows {
        listings.push(row?);
    }
    Ok(listings)
}

/// Total number of published listings.
pub fn listing_count(conn: &Connection) -> AppResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))
        .map_err(Into::into)
}

/// Case-insensitive substring search over handle, description and features.
pub fn search_listings(conn: &Connection, query: &str, limit: i64) -> AppResult<Vec<Listing>> {
    let pattern = format!("%{}%", query.to_lowercase());
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM listings
         WHERE LOWER(handle) LIKE ?1 OR LOWER(description) LIKE ?1 OR LOWER(features) LIKE ?1
         ORDER BY rating DESC, vote_count DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![pattern, limit], parse_row)?;
    let mut listings = Vec::new();
    for row in rows {
        listings.push(row?);
    }
    Ok(listings)
}

/// Listing counts per category, for the /stats report.
pub fn category_counts(conn: &Connection) -> AppResult<Vec<(Category, i64)>> {
    let mut stmt =
        conn.prepare("SELECT category, COUNT(*) FROM listings GROUP BY category ORDER BY COUNT(*) DESC")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RejectReason;
    use crate::storage::accounts::ensure_account;
    use crate::storage::db::init_schema;
    use crate::storage::submissions::{approve_submission, create_submission, get_submission};
    use rusqlite::Connection;

    fn make_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        for id in [1, 2, 3, 7, 100] {
            ensure_account(&conn, id, None).unwrap();
        }
        conn
    }

    fn publish(conn: &mut Connection, handle: &str, category: Category) -> Listing {
        let id = create_submission(conn, handle, "A cool bot", "Does X, Y", category, 100).unwrap();
        approve_submission(conn, id, 7).unwrap()
    }

    // ── round_rating ─────────────────────────────────────────────────────────

    #[test]
    fn round_rating_half_up() {
        assert_eq!(round_rating(3.25), 3.3);
        assert_eq!(round_rating(3.34), 3.3);
        assert_eq!(round_rating(3.35), 3.4);
        assert_eq!(round_rating(4.0), 4.0);
        assert_eq!(round_rating(0.0), 0.0);
    }

    // ── record_vote ──────────────────────────────────────────────────────────

    #[test]
    fn first_vote_sets_aggregates() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);

        let (updated, outcome) = record_vote(&mut conn, listing.id, 1, 5).unwrap();
        assert_eq!(outcome, VoteOutcome::First);
        assert_eq!(updated.vote_count, 1);
        assert_eq!(updated.rating, 5.0);
        assert_eq!(updated.votes.get(&1), Some(&5));
    }

    #[test]
    fn aggregates_follow_the_ledger() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);

        record_vote(&mut conn, listing.id, 1, 5).unwrap();
        record_vote(&mut conn, listing.id, 2, 3).unwrap();
        let (updated, _) = record_vote(&mut conn, listing.id, 3, 4).unwrap();

        assert_eq!(updated.vote_count, 3);
        assert_eq!(updated.rating, 4.0);
        assert_eq!(updated.vote_count as usize, updated.votes.len());
    }

    #[test]
    fn same_score_revote_is_a_noop() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);
        record_vote(&mut conn, listing.id, 1, 4).unwrap();

        let result = record_vote(&mut conn, listing.id, 1, 4);
        assert!(matches!(result, Err(AppError::AlreadyRated)));

        let unchanged = get_listing(&conn, listing.id).unwrap().unwrap();
        assert_eq!(unchanged.vote_count, 1);
        assert_eq!(unchanged.rating, 4.0);
        assert_eq!(unchanged.votes.len(), 1);
    }

    #[test]
    fn changed_score_replaces_entry() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);
        record_vote(&mut conn, listing.id, 1, 5).unwrap();
        record_vote(&mut conn, listing.id, 2, 3).unwrap();
        record_vote(&mut conn, listing.id, 3, 4).unwrap();

        let (updated, outcome) = record_vote(&mut conn, listing.id, 1, 3).unwrap();
        assert_eq!(outcome, VoteOutcome::Changed);
        assert_eq!(updated.vote_count, 3, "replacing a vote must not grow the ledger");
        assert_eq!(updated.rating, 3.3, "(3+3+4)/3 rounded to one decimal");
    }

    #[test]
    fn vote_on_missing_listing_is_not_found() {
        let mut conn = make_conn();
        assert!(matches!(record_vote(&mut conn, 99, 1, 5), Err(AppError::NotFound(_))));
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);
        assert!(matches!(
            record_vote(&mut conn, listing.id, 1, 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            record_vote(&mut conn, listing.id, 1, 6),
            Err(AppError::Validation(_))
        ));
    }

    // ── channel message ──────────────────────────────────────────────────────

    #[test]
    fn set_channel_message_id_round_trips() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);
        set_channel_message_id(&conn, listing.id, 4242).unwrap();

        let stored = get_listing(&conn, listing.id).unwrap().unwrap();
        assert_eq!(stored.channel_message_id, Some(4242));
    }

    // ── deletion ─────────────────────────────────────────────────────────────

    #[test]
    fn delete_removes_listing_and_submission() {
        let mut conn = make_conn();
        let listing = publish(&mut conn, "@bot", Category::Utility);

        let removed = delete_listing_by_handle(&mut conn, "@bot").unwrap();
        assert_eq!(removed.id, listing.id);
        assert!(get_listing(&conn, listing.id).unwrap().is_none());
        assert!(get_submission(&conn, listing.submission_id).unwrap().is_none());
    }

    #[test]
    fn delete_unknown_handle_is_not_found() {
        let mut conn = make_conn();
        assert!(matches!(
            delete_listing_by_handle(&mut conn, "@ghost"),
            Err(AppError::NotFound(_))
        ));
    }

    // ── catalog queries ──────────────────────────────────────────────────────

    #[test]
    fn top_rated_orders_by_rating() {
        let mut conn = make_conn();
        let a = publish(&mut conn, "@a", Category::Utility);
        let b = publish(&mut conn, "@b", Category::Gaming);
        record_vote(&mut conn, a.id, 1, 3).unwrap();
        record_vote(&mut conn, b.id, 1, 5).unwrap();

        let top = top_rated(&conn, 10).unwrap();
        assert_eq!(top[0].handle, "@b");
        assert_eq!(top[1].handle, "@a");
    }

    #[test]
    fn category_filter_and_counts() {
        let mut conn = make_conn();
        publish(&mut conn, "@u1", Category::Utility);
        publish(&mut conn, "@u2", Category::Utility);
        publish(&mut conn, "@g1", Category::Gaming);

        let utils = listings_by_category(&conn, Category::Utility, 10).unwrap();
        assert_eq!(utils.len(), 2);

        let counts = category_counts(&conn).unwrap();
        assert_eq!(counts[0], (Category::Utility, 2));
        assert_eq!(counts[1], (Category::Gaming, 1));
    }

    #[test]
    fn pagination_walks_the_catalog() {
        let mut conn = make_conn();
        for i in 0..4 {
            publish(&mut conn, &format!("@bot{i}"), Category::Other);
        }

        assert_eq!(listing_count(&conn).unwrap(), 4);
        let first = listings_page(&conn, 0, 3).unwrap();
        let second = listings_page(&conn, 3, 3).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn search_matches_all_text_fields_case_insensitively() {
        let mut conn = make_conn();
        publish(&mut conn, "@WeatherBot", Category::Utility);

        assert_eq!(search_listings(&conn, "weather", 5).unwrap().len(), 1);
        assert_eq!(search_listings(&conn, "COOL", 5).unwrap().len(), 1, "description match");
        assert_eq!(search_listings(&conn, "does x", 5).unwrap().len(), 1, "features match");
        assert!(search_listings(&conn, "nothing", 5).unwrap().is_empty());
    }

    #[test]
    fn rejected_submissions_never_reach_the_catalog() {
        let mut conn = make_conn();
        let id = create_submission(&mut conn, "@nope", "d", "f", Category::Other, 100).unwrap();
        crate::storage::submissions::reject_submission(&conn, id, 7, RejectReason::Spam).unwrap();

        assert_eq!(listing_count(&conn).unwrap(), 0);
    }
}
