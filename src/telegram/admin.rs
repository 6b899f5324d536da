//! Administrative commands: promotions, broadcast, statistics, deletion.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::core::config;
use crate::core::error::AppError;
use crate::core::types::Role;
use crate::storage::{accounts, get_connection, listings, submissions, DbPool};
use crate::telegram::format;
use crate::telegram::HandlerResult;

fn sender_id(msg: &Message) -> i64 {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0)
}

/// Refuse non-privileged callers; every admin command starts here.
async fn require_privileged(bot: &Bot, msg: &Message, db_pool: &DbPool) -> Result<Option<i64>, AppError> {
    let actor = sender_id(msg);
    let allowed = {
        let conn = get_connection(db_pool)?;
        accounts::is_privileged(&conn, actor)
    };
    if !allowed {
        bot.send_message(msg.chat.id, "⛔ You are not authorized to use this command.")
            .await?;
        return Ok(None);
    }
    Ok(Some(actor))
}

fn parse_account_arg(arg: &str) -> Option<i64> {
    arg.trim().parse().ok()
}

// ── promotions ───────────────────────────────────────────────────────────────

pub async fn handle_add_sudo(bot: Bot, msg: Message, db_pool: Arc<DbPool>, arg: String) -> HandlerResult {
    let Some(actor) = require_privileged(&bot, &msg, &db_pool).await? else {
        return Ok(());
    };
    if actor != *config::OWNER_ID {
        bot.send_message(msg.chat.id, "⛔ Only the Owner can add Sudo users.").await?;
        return Ok(());
    }
    let Some(target) = parse_account_arg(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /addsudo <user_id>").await?;
        return Ok(());
    };

    {
        let conn = get_connection(&db_pool)?;
        accounts::set_role(&conn, target, Role::Sudo)?;
    }
    bot.send_message(msg.chat.id, format!("✅ User {target} promoted to SUDO."))
        .await?;
    Ok(())
}

pub async fn handle_remove_sudo(bot: Bot, msg: Message, db_pool: Arc<DbPool>, arg: String) -> HandlerResult {
    let Some(actor) = require_privileged(&bot, &msg, &db_pool).await? else {
        return Ok(());
    };
    if actor != *config::OWNER_ID {
        bot.send_message(msg.chat.id, "⛔ Only the Owner can remove Sudo users.")
            .await?;
        return Ok(());
    }
    let Some(target) = parse_account_arg(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /removesudo <user_id>").await?;
        return Ok(());
    };

    let demoted = {
        let conn = get_connection(&db_pool)?;
        accounts::demote_if_role(&conn, target, Role::Sudo)?
    };
    if demoted {
        let mut reply = format!("✅ User {target} removed from SUDO.");
        if config::is_configured_sudo(target) {
            // SUDO_USERS is read once at startup; the env entry outlives this demotion
            reply.push_str("\n⚠️ Note: this id is also in SUDO_USERS and stays privileged until restart.");
        }
        bot.send_message(msg.chat.id, reply).await?;
    } else {
        bot.send_message(msg.chat.id, "⚠️ User not found or not a sudo.").await?;
    }
    Ok(())
}

pub async fn handle_add_mod(bot: Bot, msg: Message, db_pool: Arc<DbPool>, arg: String) -> HandlerResult {
    if require_privileged(&bot, &msg, &db_pool).await?.is_none() {
        return Ok(());
    }
    let Some(target) = parse_account_arg(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /addmod <user_id>").await?;
        return Ok(());
    };

    {
        let conn = get_connection(&db_pool)?;
        accounts::set_role(&conn, target, Role::Moderator)?;
    }
    bot.send_message(msg.chat.id, format!("✅ User {target} promoted to MODERATOR."))
        .await?;
    Ok(())
}

pub async fn handle_remove_mod(bot: Bot, msg: Message, db_pool: Arc<DbPool>, arg: String) -> HandlerResult {
    if require_privileged(&bot, &msg, &db_pool).await?.is_none() {
        return Ok(());
    }
    let Some(target) = parse_account_arg(&arg) else {
        bot.send_message(msg.chat.id, "Usage: /removemod <user_id>").await?;
        return Ok(());
    };

    let demoted = {
        let conn = get_connection(&db_pool)?;
        accounts::demote_if_role(&conn, target, Role::Moderator)?
    };
    let reply = if demoted {
        format!("✅ User {target} removed from MODERATOR.")
    } else {
        "⚠️ User not found or not a moderator.".to_string()
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

// ── broadcast ────────────────────────────────────────────────────────────────

/// Send an announcement to every known account, one attempt per recipient.
pub async fn handle_broadcast(bot: Bot, msg: Message, db_pool: Arc<DbPool>, message: String) -> HandlerResult {
    if require_privileged(&bot, &msg, &db_pool).await?.is_none() {
        return Ok(());
    }
    let message = message.trim();
    if message.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /broadcast <message>").await?;
        return Ok(());
    }

    let recipients = {
        let conn = get_connection(&db_pool)?;
        accounts::all_account_ids(&conn)?
    };

    let text = format::broadcast_text(message);
    let mut delivered = 0usize;
    for recipient in recipients {
        match bot
            .send_message(ChatId(recipient), &text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => delivered += 1,
            Err(e) => log::debug!("Broadcast to {} failed: {}", recipient, e),
        }
    }

    bot.send_message(msg.chat.id, format!("✅ Broadcast sent to {delivered} users."))
        .await?;
    Ok(())
}

// ── statistics ───────────────────────────────────────────────────────────────

pub async fn handle_stats(bot: Bot, msg: Message, db_pool: Arc<DbPool>) -> HandlerResult {
    if require_privileged(&bot, &msg, &db_pool).await?.is_none() {
        return Ok(());
    }

    let (account_total, listing_total, open_total, per_category) = {
        let conn = get_connection(&db_pool)?;
        (
            accounts::account_count(&conn)?,
            listings::listing_count(&conn)?,
            submissions::open_count(&conn)?,
            listings::category_counts(&conn)?,
        )
    };

    bot.send_message(
        msg.chat.id,
        format::stats_text(account_total, listing_total, open_total, &per_category),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

// ── pending queue ────────────────────────────────────────────────────────────

pub async fn handle_pending(bot: Bot, msg: Message, db_pool: Arc<DbPool>) -> HandlerResult {
    if require_privileged(&bot, &msg, &db_pool).await?.is_none() {
        return Ok(());
    }

    let (open, open_total) = {
        let conn = get_connection(&db_pool)?;
        (
            submissions::open_submissions(&conn, config::catalog::PENDING_LIMIT)?,
            submissions::open_count(&conn)?,
        )
    };

    let mut request = bot
        .send_message(msg.chat.id, format::pending_queue_text(&open, open_total))
        .parse_mode(ParseMode::Html);
    if let Some(keyboard) = format::pending_queue_keyboard(&open) {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

// ── deletion ─────────────────────────────────────────────────────────────────

/// /deletebot <handle> — purge a listing, its submission, and its post.
pub async fn handle_delete_bot(bot: Bot, msg: Message, db_pool: Arc<DbPool>, arg: String) -> HandlerResult {
    if require_privileged(&bot, &msg, &db_pool).await?.is_none() {
        return Ok(());
    }
    let arg = arg.trim();
    if arg.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /deletebot <username>").await?;
        return Ok(());
    }
    let handle = if arg.starts_with('@') {
        arg.to_string()
    } else {
        format!("@{arg}")
    };

    let removed = {
        let mut conn = get_connection(&db_pool)?;
        listings::delete_listing_by_handle(&mut conn, &handle)
    };

    let listing = match removed {
        Ok(listing) => listing,
        Err(AppError::NotFound(_)) => {
            bot.send_message(msg.chat.id, format!("❌ Bot {handle} not found in library."))
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Rows are gone; now clean up the public post, best-effort
    if let (Some(message_id), Some(channel_id)) = (listing.channel_message_id, *config::CHANNEL_ID) {
        if let Err(e) = bot
            .delete_message(ChatId(channel_id), teloxide::types::MessageId(message_id))
            .await
        {
            bot.send_message(msg.chat.id, format!("⚠️ Could not delete channel post: {e}"))
                .await?;
        }
    }

    bot.send_message(
        msg.chat.id,
        format!("✅ Bot {handle} has been completely removed from the database."),
    )
    .await?;
    Ok(())
}
