//! Moderation actions: claim, unclaim, approve, reject.
//!
//! Every action re-reads the submission row and commits its mutation before
//! any outward message is sent; channel posts and submitter notifications
//! are best-effort and never unwind a committed decision.

use std::collections::HashSet;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::types::RejectReason;
use crate::storage::{accounts, get_connection, listings, submissions, DbPool};
use crate::telegram::format;
use crate::telegram::HandlerResult;

/// Display name used in review-card status lines.
fn reviewer_name(user: &teloxide::types::User) -> String {
    match &user.username {
        Some(username) => format!("@{username}"),
        None => user.first_name.clone(),
    }
}

fn actor_id(user: &teloxide::types::User) -> i64 {
    i64::try_from(user.id.0).unwrap_or(0)
}

/// Where the pressed button lives, for in-place re-rendering.
fn message_ref(q: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    q.message.as_ref().map(|m| (m.chat().id, m.id()))
}

async fn answer(bot: &Bot, q: &CallbackQuery, text: &str) {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).text(text).await {
        log::warn!("Failed to answer callback query: {}", e);
    }
}

async fn answer_alert(bot: &Bot, q: &CallbackQuery, text: &str) {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).text(text).show_alert(true).await {
        log::warn!("Failed to answer callback query: {}", e);
    }
}

fn check_privileged(db_pool: &DbPool, actor: i64) -> AppResult<bool> {
    let conn = get_connection(db_pool)?;
    Ok(accounts::is_privileged(&conn, actor))
}

/// Everyone who should hear about new submissions: the configured sudo set
/// plus every account holding a privileged role in the database.
fn notification_recipients(db_pool: &DbPool) -> Vec<i64> {
    let mut recipients: HashSet<i64> = config::SUDO_USERS.iter().copied().collect();
    match get_connection(db_pool) {
        Ok(conn) => match accounts::privileged_account_ids(&conn) {
            Ok(ids) => recipients.extend(ids),
            Err(e) => log::error!("Failed to load privileged accounts: {}", e),
        },
        Err(e) => log::error!("Failed to get DB connection for notification fan-out: {}", e),
    }
    let mut list: Vec<i64> = recipients.into_iter().collect();
    list.sort_unstable();
    list
}

/// Send the review card to every privileged account.
///
/// Each recipient is attempted independently; one blocked chat must not
/// starve the rest of the team.
pub async fn notify_new_submission(bot: Bot, db_pool: Arc<DbPool>, submission_id: i64) {
    let submission = {
        let conn = match get_connection(&db_pool) {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("Failed to get DB connection for submission notification: {}", e);
                return;
            }
        };
        match submissions::get_submission(&conn, submission_id) {
            Ok(Some(sub)) => sub,
            Ok(None) => {
                log::warn!("Submission #{} vanished before notification", submission_id);
                return;
            }
            Err(e) => {
                log::error!("Failed to load submission #{}: {}", submission_id, e);
                return;
            }
        }
    };

    let text = format::review_card_text(&submission, None);
    let keyboard = format::claim_keyboard(submission_id);

    for recipient in notification_recipients(&db_pool) {
        if let Err(e) = bot
            .send_message(ChatId(recipient), &text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            log::warn!("Failed to send review notification to {}: {}", recipient, e);
        }
    }
}

/// "I Will Check" button.
pub async fn handle_claim(bot: Bot, q: CallbackQuery, db_pool: Arc<DbPool>, submission_id: i64) -> HandlerResult {
    let actor = actor_id(&q.from);
    if !check_privileged(&db_pool, actor)? {
        answer_alert(&bot, &q, "⛔ You are not part of the moderation team.").await;
        return Ok(());
    }

    let claimed = {
        let conn = get_connection(&db_pool)?;
        submissions::claim_submission(&conn, submission_id, actor)
    };

    match claimed {
        Ok(sub) => {
            if let Some((chat_id, message_id)) = message_ref(&q) {
                bot.edit_message_text(
                    chat_id,
                    message_id,
                    format::review_card_text(&sub, Some(&reviewer_name(&q.from))),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(format::review_keyboard(submission_id))
                .await?;
            }
            answer(&bot, &q, "✅ You claimed this submission.").await;
        }
        Err(AppError::AlreadyClaimed) => {
            answer_alert(&bot, &q, "⚠️ Already claimed by another mod!").await;
        }
        Err(AppError::NotFound(_)) => {
            answer_alert(&bot, &q, "⚠️ This submission is gone or already resolved.").await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// "Unclaim" button.
pub async fn handle_unclaim(bot: Bot, q: CallbackQuery, db_pool: Arc<DbPool>, submission_id: i64) -> HandlerResult {
    let actor = actor_id(&q.from);
    if !check_privileged(&db_pool, actor)? {
        answer_alert(&bot, &q, "⛔ You are not part of the moderation team.").await;
        return Ok(());
    }

    let released = {
        let conn = get_connection(&db_pool)?;
        submissions::unclaim_submission(&conn, submission_id, actor)
    };

    match released {
        Ok(sub) => {
            if let Some((chat_id, message_id)) = message_ref(&q) {
                bot.edit_message_text(chat_id, message_id, format::review_card_text(&sub, None))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(format::claim_keyboard(submission_id))
                    .await?;
            }
            answer(&bot, &q, "Unclaimed.").await;
        }
        Err(AppError::AlreadyClaimed | AppError::NotClaimant) => {
            answer_alert(&bot, &q, "⚠️ You didn't claim this.").await;
        }
        Err(AppError::NotFound(_)) => {
            answer_alert(&bot, &q, "⚠️ This submission is gone or already resolved.").await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// "Approve" button: flips the submission, creates the listing, then runs
/// the best-effort publication steps.
pub async fn handle_approve(bot: Bot, q: CallbackQuery, db_pool: Arc<DbPool>, submission_id: i64) -> HandlerResult {
    let actor = actor_id(&q.from);
    if !check_privileged(&db_pool, actor)? {
        answer_alert(&bot, &q, "⛔ You are not part of the moderation team.").await;
        return Ok(());
    }

    let approved = {
        let mut conn = get_connection(&db_pool)?;
        submissions::approve_submission(&mut conn, submission_id, actor)
    };

    let listing = match approved {
        Ok(listing) => listing,
        Err(AppError::AlreadyClaimed) => {
            answer_alert(&bot, &q, "⚠️ Already claimed by another mod!").await;
            return Ok(());
        }
        Err(AppError::NotFound(_)) => {
            answer_alert(&bot, &q, "⚠️ This submission is gone or already resolved.").await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Decision is committed; everything below is delivery.
    publish_listing(&bot, &db_pool, &q, &listing).await;

    if let Err(e) = bot
        .send_message(
            ChatId(listing.submitted_by),
            format!("🎉 Congratulations! Your bot {} has been approved!", listing.handle),
        )
        .await
    {
        // Submitter may have blocked the bot
        log::warn!("Failed to notify submitter {}: {}", listing.submitted_by, e);
    }

    if let Some((chat_id, message_id)) = message_ref(&q) {
        bot.edit_message_text(chat_id, message_id, format!("✅ Approved by {}", reviewer_name(&q.from)))
            .await?;
    }
    answer(&bot, &q, "Approved.").await;
    Ok(())
}

/// Post the new listing to the public channel and remember the message id.
async fn publish_listing(bot: &Bot, db_pool: &DbPool, q: &CallbackQuery, listing: &listings::Listing) {
    let Some(channel_id) = *config::CHANNEL_ID else {
        log::warn!("CHANNEL_ID not configured; listing {} not published", listing.handle);
        return;
    };

    let posted = bot
        .send_message(ChatId(channel_id), format::channel_post_text(listing))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::rating_keyboard(listing.id))
        .await;

    match posted {
        Ok(message) => {
            let stored = get_connection(db_pool)
                .map_err(AppError::from)
                .and_then(|conn| listings::set_channel_message_id(&conn, listing.id, message.id.0));
            if let Err(e) = stored {
                log::error!("Failed to store channel message id for listing {}: {}", listing.id, e);
            }
        }
        Err(e) => {
            log::error!("Channel post failed for {}: {}", listing.handle, e);
            if let Some((chat_id, _)) = message_ref(q) {
                let _ = bot
                    .send_message(chat_id, format!("⚠️ Approved but failed to post to channel: {e}"))
                    .await;
            }
        }
    }
}

/// "Reject" button, phase one: show the reason menu.
pub async fn handle_reject_menu(bot: Bot, q: CallbackQuery, db_pool: Arc<DbPool>, submission_id: i64) -> HandlerResult {
    let actor = actor_id(&q.from);
    if !check_privileged(&db_pool, actor)? {
        answer_alert(&bot, &q, "⛔ You are not part of the moderation team.").await;
        return Ok(());
    }

    let still_open = {
        let conn = get_connection(&db_pool)?;
        submissions::get_submission(&conn, submission_id)?.is_some_and(|sub| sub.status.is_open())
    };
    if !still_open {
        answer_alert(&bot, &q, "⚠️ This submission is gone or already resolved.").await;
        return Ok(());
    }

    if let Some((chat_id, message_id)) = message_ref(&q) {
        bot.edit_message_text(chat_id, message_id, "❓ <b>Select Rejection Reason</b>:")
            .parse_mode(ParseMode::Html)
            .reply_markup(format::reject_reason_keyboard(submission_id))
            .await?;
    }
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        log::warn!("Failed to answer callback query: {}", e);
    }
    Ok(())
}

/// Reason button, phase two: commit the rejection and notify the submitter.
pub async fn handle_reject(
    bot: Bot,
    q: CallbackQuery,
    db_pool: Arc<DbPool>,
    submission_id: i64,
    reason: RejectReason,
) -> HandlerResult {
    let actor = actor_id(&q.from);
    if !check_privileged(&db_pool, actor)? {
        answer_alert(&bot, &q, "⛔ You are not part of the moderation team.").await;
        return Ok(());
    }

    let rejected = {
        let conn = get_connection(&db_pool)?;
        submissions::reject_submission(&conn, submission_id, actor, reason)
    };

    let sub = match rejected {
        Ok(sub) => sub,
        Err(AppError::AlreadyClaimed) => {
            answer_alert(&bot, &q, "⚠️ Already claimed by another mod!").await;
            return Ok(());
        }
        Err(AppError::NotFound(_)) => {
            answer_alert(&bot, &q, "⚠️ This submission is gone or already resolved.").await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = bot
        .send_message(
            ChatId(sub.submitted_by),
            format!(
                "❌ <b>Submission Rejected</b>\n\nYour bot {} was not approved.\n<b>Reason</b>: {}",
                teloxide::utils::html::escape(&sub.handle),
                reason.text(),
            ),
        )
        .parse_mode(ParseMode::Html)
        .await
    {
        log::warn!("Failed to notify submitter {}: {}", sub.submitted_by, e);
    }

    if let Some((chat_id, message_id)) = message_ref(&q) {
        bot.edit_message_text(
            chat_id,
            message_id,
            format!("❌ Rejected by {}\nReason: {}", reviewer_name(&q.from), reason.code()),
        )
        .await?;
    }
    answer(&bot, &q, "Rejected.").await;
    Ok(())
}
