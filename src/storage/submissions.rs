//! Submission rows and the review-queue mutations.
//!
//! Every mutation here is a conditional update guarded on the current row
//! state, so two reviewers racing on the same submission resolve through
//! SQLite's row atomicity: exactly one statement matches, the other affects
//! zero rows and is mapped to a typed error without touching the row.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::core::error::{AppError, AppResult};
use crate::core::types::{Category, RejectReason, SubmissionStatus};
use crate::storage::listings::{self, Listing};

/// A submission row from the database.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i64,
    pub handle: String,
    pub description: String,
    pub features: String,
    pub category: Category,
    pub submitted_by: i64,
    pub submitted_at: String,
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub claimed_by: Option<i64>,
    pub claimed_at: Option<String>,
}

fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        handle: row.get(1)?,
        description: row.get(2)?,
        features: row.get(3)?,
        category: row.get(4)?,
        submitted_by: row.get(5)?,
        submitted_at: row.get(6)?,
        status: row.get(7)?,
        rejection_reason: row.get(8)?,
        claimed_by: row.get(9)?,
        claimed_at: row.get(10)?,
    })
}

const SELECT_COLUMNS: &str = "id, handle, description, features, category, submitted_by, submitted_at,
     status, rejection_reason, claimed_by, claimed_at";

/// Get a submission by id.
pub fn get_submission(conn: &Connection, id: i64) -> AppResult<Option<Submission>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM submissions WHERE id = ?1"),
        params![id],
        parse_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Create a pending submission after checking the handle is free.
///
/// The duplicate checks and the insert run in one immediate transaction;
/// the partial unique index on open submissions backstops the same rule if
/// a second writer gets in between anyway.
///
/// Returns the new submission id.
pub fn create_submission(
    conn: &mut Connection,
    handle: &str,
    description: &str,
    features: &str,
    category: Category,
    submitted_by: i64,
) -> AppResult<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let listed: bool = tx.query_row(
        "SELECT COUNT(*) FROM listings WHERE handle = ?1",
        params![handle],
        |row| Ok(row.get::<_, i64>(0)? > 0),
    )?;
    if listed {
        return Err(AppError::Duplicate(format!("{handle} is already in the library")));
    }

    let open: bool = tx.query_row(
        "SELECT COUNT(*) FROM submissions WHERE handle = ?1 AND status IN ('pending', 'under_review')",
        params![handle],
        |row| Ok(row.get::<_, i64>(0)? > 0),
    )?;
    if open {
        return Err(AppError::Duplicate(format!(
            "{handle} is already submitted and pending review"
        )));
    }

    tx.execute(
        "INSERT INTO submissions (handle, description, features, category, submitted_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![handle, description, features, category, submitted_by],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(id)
}

/// Figure out why a guarded update matched nothing.
fn diagnose_claim_conflict(conn: &Connection, id: i64, actor: i64) -> AppError {
    match get_submission(conn, id) {
        Ok(Some(sub)) if !sub.status.is_open() => {
            AppError::NotFound(format!("submission #{id} is already resolved"))
        }
        Ok(Some(sub)) if sub.claimed_by.is_some_and(|c| c != actor) => AppError::AlreadyClaimed,
        Ok(Some(_)) => AppError::NotClaimant,
        Ok(None) => AppError::NotFound(format!("submission #{id} no longer exists")),
        Err(e) => e,
    }
}

/// Claim a submission for review.
///
/// Idempotent for the current claim holder. A claim held by anyone else
/// fails with `AlreadyClaimed` and leaves the row untouched.
pub fn claim_submission(conn: &Connection, id: i64, actor: i64) -> AppResult<Submission> {
    let changed = conn.execute(
        "UPDATE submissions
         SET claimed_by = ?2, claimed_at = CURRENT_TIMESTAMP, status = 'under_review'
         WHERE id = ?1
           AND status IN ('pending', 'under_review')
           AND (claimed_by IS NULL OR claimed_by = ?2)",
        params![id, actor],
    )?;

    if changed == 0 {
        return Err(diagnose_claim_conflict(conn, id, actor));
    }
    get_submission(conn, id)?.ok_or_else(|| AppError::NotFound(format!("submission #{id} no longer exists")))
}

/// Release a claim, returning the submission to the open queue.
///
/// Only the current claim holder may unclaim.
pub fn unclaim_submission(conn: &Connection, id: i64, actor: i64) -> AppResult<Submission> {
    let changed = conn.execute(
        "UPDATE submissions
         SET claimed_by = NULL, claimed_at = NULL, status = 'pending'
         WHERE id = ?1 AND status = 'under_review' AND claimed_by = ?2",
        params![id, actor],
    )?;

    if changed == 0 {
        return Err(diagnose_claim_conflict(conn, id, actor));
    }
    get_submission(conn, id)?.ok_or_else(|| AppError::NotFound(format!("submission #{id} no longer exists")))
}

/// Approve a submission and create its listing in one transaction.
///
/// The status flip is guarded on the submission still being open, so a
/// duplicate approve trigger matches zero rows and can never produce a
/// second listing. The claim holder, when set, must be the actor.
pub fn approve_submission(conn: &mut Connection, id: i64, actor: i64) -> AppResult<Listing> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let changed = tx.execute(
        "UPDATE submissions
         SET status = 'approved', claimed_by = ?2
         WHERE id = ?1
           AND status IN ('pending', 'under_review')
           AND (claimed_by IS NULL OR claimed_by = ?2)",
        params![id, actor],
    )?;
    if changed == 0 {
        let err = diagnose_claim_conflict(&tx, id, actor);
        drop(tx);
        return Err(err);
    }

    let sub = tx
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM submissions WHERE id = ?1"),
            params![id],
            parse_row,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("submission #{id} no longer exists")))?;

    tx.execute(
        "INSERT INTO listings (submission_id, handle, description, features, category,
                               submitted_by, approved_by, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sub.id,
            sub.handle,
            sub.description,
            sub.features,
            sub.category,
            sub.submitted_by,
            actor,
            sub.submitted_at,
        ],
    )?;
    let listing_id = tx.last_insert_rowid();
    tx.commit()?;

    listings::get_listing(conn, listing_id)?
        .ok_or_else(|| AppError::NotFound(format!("listing #{listing_id} vanished after approval")))
}

/// Reject a submission with a canned reason.
///
/// Same guards as approval; the mapped reason text is stored on the row for
/// the audit trail and for the submitter notification.
pub fn reject_submission(conn: &Connection, id: i64, actor: i64, reason: RejectReason) -> AppResult<Submission> {
    let changed = conn.execute(
        "UPDATE submissions
         SET status = 'rejected', rejection_reason = ?3, claimed_by = ?2
         WHERE id = ?1
           AND status IN ('pending', 'under_review')
           AND (claimed_by IS NULL OR claimed_by = ?2)",
        params![id, actor, reason.text()],
    )?;

    if changed == 0 {
        return Err(diagnose_claim_conflict(conn, id, actor));
    }
    get_submission(conn, id)?.ok_or_else(|| AppError::NotFound(format!("submission #{id} no longer exists")))
}

/// Whether a handle already has a submission awaiting a decision.
pub fn has_open_submission(conn: &Connection, handle: &str) -> AppResult<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM submissions WHERE handle = ?1 AND status IN ('pending', 'under_review')",
        params![handle],
        |row| Ok(row.get::<_, i64>(0)? > 0),
    )
    .map_err(Into::into)
}

/// Open submissions, oldest first.
pub fn open_submissions(conn: &Connection, limit: i64) -> AppResult<Vec<Submission>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM submissions
         WHERE status IN ('pending', 'under_review')
         ORDER BY submitted_at ASC, id ASC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], parse_row)?;
    let mut subs = Vec::new();
    for row in rows {
        subs.push(row?);
    }
    Ok(subs)
}

/// Number of submissions still awaiting a decision.
pub fn open_count(conn: &Connection) -> AppResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM submissions WHERE status IN ('pending', 'under_review')",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
