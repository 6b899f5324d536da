//! Star-rating buttons on channel posts.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::core::error::AppError;
use crate::storage::listings::VoteOutcome;
use crate::storage::{accounts, get_connection, listings, DbPool};
use crate::telegram::format;
use crate::telegram::HandlerResult;

/// A rating button was pressed on the public post.
///
/// The vote commits first; refreshing the post display is best-effort and a
/// failure there is only reported back to the voter.
pub async fn handle_rate(bot: Bot, q: CallbackQuery, db_pool: Arc<DbPool>, listing_id: i64, score: u8) -> HandlerResult {
    let voter = i64::try_from(q.from.id.0).unwrap_or(0);

    let voted = {
        let mut conn = get_connection(&db_pool)?;
        accounts::ensure_account(&conn, voter, q.from.username.as_deref())?;
        listings::record_vote(&mut conn, listing_id, voter, score)
    };

    let (listing, outcome) = match voted {
        Ok(result) => result,
        Err(AppError::AlreadyRated) => {
            answer(&bot, &q, &format!("✅ You already rated {score} stars!"), false).await;
            return Ok(());
        }
        Err(AppError::NotFound(_)) => {
            answer(&bot, &q, "Bot not found!", true).await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let ack = match outcome {
        VoteOutcome::First => format!("✅ You rated {score} stars!"),
        VoteOutcome::Changed => format!("✅ Rating updated to {score} stars!"),
    };

    // Re-render the post from the fresh row, keeping the rating buttons
    let rendered = match q.message.as_ref().map(|m| (m.chat().id, m.id())) {
        Some((chat_id, message_id)) => bot
            .edit_message_text(chat_id, message_id, format::channel_post_text(&listing))
            .parse_mode(ParseMode::Html)
            .reply_markup(format::rating_keyboard(listing.id))
            .await
            .map(|_| ()),
        None => Ok(()),
    };

    match rendered {
        Ok(()) => answer(&bot, &q, &ack, false).await,
        Err(e) => {
            log::error!("Rating display update failed for listing {}: {}", listing.id, e);
            answer(&bot, &q, "⚠️ Vote recorded, but updating the display failed.", true).await;
        }
    }
    Ok(())
}

async fn answer(bot: &Bot, q: &CallbackQuery, text: &str, alert: bool) {
    let request = bot.answer_callback_query(q.id.clone()).text(text).show_alert(alert);
    if let Err(e) = request.await {
        log::warn!("Failed to answer rating callback: {}", e);
    }
}
