//! End-to-end flows over the storage engines: submit → review → publish →
//! rate, against an in-memory database.
//!
//! Run with: cargo test --test directory_flow_test

use pretty_assertions::assert_eq;
use rusqlite::Connection;

use botlibrary::core::types::{Category, RejectReason, SubmissionStatus};
use botlibrary::core::AppError;
use botlibrary::storage::db::init_schema;
use botlibrary::storage::{accounts, listings, submissions};

const SUBMITTER: i64 = 100;
const MOD_A: i64 = 7;
const MOD_B: i64 = 8;

fn make_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    for id in [SUBMITTER, MOD_A, MOD_B, 201, 202, 203] {
        accounts::ensure_account(&conn, id, None).unwrap();
    }
    conn
}

fn submit(conn: &mut Connection, handle: &str) -> i64 {
    submissions::create_submission(conn, handle, "A cool bot", "Does X, Y", Category::Utility, SUBMITTER).unwrap()
}

#[test]
fn submission_happy_path_produces_one_pending_row() {
    let mut conn = make_conn();
    let id = submissions::create_submission(
        &mut conn,
        "@mybot",
        "A cool bot",
        "Does X, Y",
        Category::Utility,
        SUBMITTER,
    )
    .unwrap();

    let sub = submissions::get_submission(&conn, id).unwrap().unwrap();
    assert_eq!(sub.handle, "@mybot");
    assert_eq!(sub.description, "A cool bot");
    assert_eq!(sub.features, "Does X, Y");
    assert_eq!(sub.category, Category::Utility);
    assert_eq!(sub.status, SubmissionStatus::Pending);
    assert_eq!(submissions::open_count(&conn).unwrap(), 1);
}

#[test]
fn claim_race_has_exactly_one_winner() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@contested");

    // Moderator A claims #N, moderator B then attempts the same claim
    submissions::claim_submission(&conn, id, MOD_A).unwrap();
    let loser = submissions::claim_submission(&conn, id, MOD_B);
    assert!(matches!(loser, Err(AppError::AlreadyClaimed)));

    let sub = submissions::get_submission(&conn, id).unwrap().unwrap();
    assert_eq!(sub.claimed_by, Some(MOD_A), "submission must still show A as holder");
}

#[test]
fn full_lifecycle_submit_claim_approve_vote() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@lifecycle");

    submissions::claim_submission(&conn, id, MOD_A).unwrap();
    let listing = submissions::approve_submission(&mut conn, id, MOD_A).unwrap();

    assert_eq!(listing.handle, "@lifecycle");
    assert_eq!(listing.approved_by, MOD_A);
    assert_eq!(listing.rating, 0.0);
    assert_eq!(listing.vote_count, 0);

    // Listing #N gains votes {201:5, 202:3}; voter 203 votes 4
    listings::record_vote(&mut conn, listing.id, 201, 5).unwrap();
    listings::record_vote(&mut conn, listing.id, 202, 3).unwrap();
    let (after_third, _) = listings::record_vote(&mut conn, listing.id, 203, 4).unwrap();
    assert_eq!(after_third.vote_count, 3);
    assert_eq!(after_third.rating, 4.0);

    // First voter revises 5 → 3: count unchanged, mean re-rounded
    let (after_edit, outcome) = listings::record_vote(&mut conn, listing.id, 201, 3).unwrap();
    assert_eq!(outcome, listings::VoteOutcome::Changed);
    assert_eq!(after_edit.vote_count, 3);
    assert_eq!(after_edit.rating, 3.3);

    // Aggregates always agree with the ledger
    assert_eq!(after_edit.vote_count as usize, after_edit.votes.len());
}

#[test]
fn approved_handle_blocks_resubmission_before_any_row_is_written() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@foo");
    submissions::approve_submission(&mut conn, id, MOD_A).unwrap();

    let attempt = submissions::create_submission(&mut conn, "@foo", "again", "again", Category::Gaming, 202);
    assert!(matches!(attempt, Err(AppError::Duplicate(_))));
    assert_eq!(submissions::open_count(&conn).unwrap(), 0, "no pending row may exist");
}

#[test]
fn duplicate_approve_trigger_cannot_double_publish() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@once");
    submissions::approve_submission(&mut conn, id, MOD_A).unwrap();

    assert!(submissions::approve_submission(&mut conn, id, MOD_B).is_err());
    assert_eq!(listings::listing_count(&conn).unwrap(), 1);
}

#[test]
fn rejection_keeps_audit_trail_and_frees_the_handle() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@judged");
    submissions::claim_submission(&conn, id, MOD_A).unwrap();
    submissions::reject_submission(&conn, id, MOD_A, RejectReason::InsufficientDescription).unwrap();

    let sub = submissions::get_submission(&conn, id).unwrap().unwrap();
    assert_eq!(sub.status, SubmissionStatus::Rejected);
    assert_eq!(
        sub.rejection_reason.as_deref(),
        Some(RejectReason::InsufficientDescription.text())
    );

    // The rejected row stays for audit, but the handle is free again
    assert!(submissions::create_submission(&mut conn, "@judged", "d", "f", Category::Other, 202).is_ok());
}

#[test]
fn unclaim_returns_submission_to_the_open_queue() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@bounced");

    submissions::claim_submission(&conn, id, MOD_A).unwrap();
    submissions::unclaim_submission(&conn, id, MOD_A).unwrap();

    // B can now claim what A released
    let sub = submissions::claim_submission(&conn, id, MOD_B).unwrap();
    assert_eq!(sub.claimed_by, Some(MOD_B));
}

#[test]
fn same_score_revote_changes_nothing() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@steady");
    let listing = submissions::approve_submission(&mut conn, id, MOD_A).unwrap();

    listings::record_vote(&mut conn, listing.id, 201, 4).unwrap();
    let noop = listings::record_vote(&mut conn, listing.id, 201, 4);
    assert!(matches!(noop, Err(AppError::AlreadyRated)));

    let unchanged = listings::get_listing(&conn, listing.id).unwrap().unwrap();
    assert_eq!(unchanged.vote_count, 1);
    assert_eq!(unchanged.rating, 4.0);
    assert_eq!(unchanged.votes.len(), 1);
}

#[test]
fn admin_purge_removes_listing_and_submission() {
    let mut conn = make_conn();
    let id = submit(&mut conn, "@doomed");
    let listing = submissions::approve_submission(&mut conn, id, MOD_A).unwrap();
    listings::record_vote(&mut conn, listing.id, 201, 5).unwrap();

    listings::delete_listing_by_handle(&mut conn, "@doomed").unwrap();

    assert!(listings::get_listing(&conn, listing.id).unwrap().is_none());
    assert!(submissions::get_submission(&conn, id).unwrap().is_none());
    // With everything purged, the handle may be submitted afresh
    assert!(submissions::create_submission(&mut conn, "@doomed", "d", "f", Category::Other, 202).is_ok());
}

#[test]
fn moderator_promotion_grants_and_demotion_revokes_access() {
    let conn = make_conn();
    assert!(!accounts::is_privileged(&conn, 201));

    accounts::set_role(&conn, 201, botlibrary::core::types::Role::Moderator).unwrap();
    assert!(accounts::is_privileged(&conn, 201));

    accounts::demote_if_role(&conn, 201, botlibrary::core::types::Role::Moderator).unwrap();
    assert!(!accounts::is_privileged(&conn, 201));
}
