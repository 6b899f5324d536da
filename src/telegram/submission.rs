//! The submission conversation: a per-chat dialogue collecting bot metadata.
//!
//! Draft fields ride inside the state variants, so ending the dialogue (for
//! any reason) tears the draft down with it and nothing leaks between
//! submitters.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use crate::core::error::AppError;
use crate::core::types::Category;
use crate::storage::{accounts, get_connection, listings, submissions, DbPool};
use crate::telegram::format;
use crate::telegram::moderation;
use crate::telegram::{HandlerResult, SubmitDialogue};

/// Collected answers, complete once the category is picked.
#[derive(Clone, Debug)]
pub struct Draft {
    pub handle: String,
    pub description: String,
    pub features: String,
    pub category: Category,
}

/// Conversation state for one submitter chat.
#[derive(Clone, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    AwaitingHandle,
    AwaitingDescription {
        handle: String,
    },
    AwaitingFeatures {
        handle: String,
        description: String,
    },
    AwaitingCategory {
        handle: String,
        description: String,
        features: String,
    },
    AwaitingConfirmation {
        draft: Draft,
    },
}

/// Entry point for /add and the "Add a Bot" button.
pub async fn start_submission(bot: Bot, dialogue: SubmitDialogue, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, "🤖 Please enter the <b>Bot Username</b> (e.g., @example_bot):")
        .parse_mode(ParseMode::Html)
        .await?;
    dialogue.update(SubmitState::AwaitingHandle).await?;
    Ok(())
}

/// /cancel — accepted in every state; tears the draft down.
pub async fn cancel(bot: Bot, dialogue: SubmitDialogue, msg: Message) -> HandlerResult {
    dialogue.exit().await?;
    bot.send_message(msg.chat.id, "🛑 Operation cancelled.").await?;
    Ok(())
}

pub async fn receive_handle(bot: Bot, dialogue: SubmitDialogue, msg: Message, db_pool: Arc<DbPool>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let handle = text.trim().to_string();

    if !handle.starts_with('@') {
        // Validation failure: re-prompt, stay in state
        bot.send_message(msg.chat.id, "⚠️ Username must start with '@'. Please try again:")
            .await?;
        return Ok(());
    }

    // Duplicate checks terminate the conversation; the insert re-checks
    // under a transaction in case someone wins a race in between.
    let duplicate = {
        let conn = get_connection(&db_pool)?;
        if listings::get_listing_by_handle(&conn, &handle)?.is_some() {
            Some("⚠️ This bot is already in our library!")
        } else if submissions::has_open_submission(&conn, &handle)? {
            Some("⚠️ This bot is already submitted and pending review.")
        } else {
            None
        }
    };
    if let Some(message) = duplicate {
        bot.send_message(msg.chat.id, message).await?;
        dialogue.exit().await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        "📝 <b>Description</b>:\nProvide a brief description of your bot:",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    dialogue.update(SubmitState::AwaitingDescription { handle }).await?;
    Ok(())
}

pub async fn receive_description(bot: Bot, dialogue: SubmitDialogue, msg: Message, handle: String) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    bot.send_message(msg.chat.id, "⚙️ <b>Features</b>:\nList the main features of your bot:")
        .parse_mode(ParseMode::Html)
        .await?;
    dialogue
        .update(SubmitState::AwaitingFeatures {
            handle,
            description: text.to_string(),
        })
        .await?;
    Ok(())
}

pub async fn receive_features(
    bot: Bot,
    dialogue: SubmitDialogue,
    msg: Message,
    (handle, description): (String, String),
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    bot.send_message(msg.chat.id, "🏷️ Select a <b>Category</b>:")
        .parse_mode(ParseMode::Html)
        .reply_markup(format::category_keyboard())
        .await?;
    dialogue
        .update(SubmitState::AwaitingCategory {
            handle,
            description,
            features: text.to_string(),
        })
        .await?;
    Ok(())
}

/// Category button pressed. Renders the confirmation summary in place.
pub async fn category_selected(
    bot: Bot,
    dialogue: SubmitDialogue,
    chat_id: ChatId,
    message_id: MessageId,
    category: Category,
) -> HandlerResult {
    let Some(SubmitState::AwaitingCategory {
        handle,
        description,
        features,
    }) = dialogue.get().await?
    else {
        // Stale button from an earlier conversation; nothing to do
        return Ok(());
    };

    let draft = Draft {
        handle,
        description,
        features,
        category,
    };
    bot.edit_message_text(chat_id, message_id, format::confirmation_text(&draft))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::confirm_keyboard())
        .await?;
    dialogue.update(SubmitState::AwaitingConfirmation { draft }).await?;
    Ok(())
}

/// Confirmation button pressed: persist and hand over to moderation, or
/// discard the draft.
pub async fn confirmation_answered(
    bot: Bot,
    dialogue: SubmitDialogue,
    db_pool: Arc<DbPool>,
    chat_id: ChatId,
    message_id: MessageId,
    submitter: i64,
    submitter_username: Option<String>,
    submit: bool,
) -> HandlerResult {
    let Some(SubmitState::AwaitingConfirmation { draft }) = dialogue.get().await? else {
        return Ok(());
    };

    if !submit {
        bot.edit_message_text(chat_id, message_id, "❌ Submission cancelled.").await?;
        dialogue.exit().await?;
        return Ok(());
    }

    let created = {
        let mut conn = get_connection(&db_pool)?;
        accounts::ensure_account(&conn, submitter, submitter_username.as_deref())?;
        submissions::create_submission(
            &mut conn,
            &draft.handle,
            &draft.description,
            &draft.features,
            draft.category,
            submitter,
        )
    };

    match created {
        Ok(submission_id) => {
            bot.edit_message_text(chat_id, message_id, "✅ <b>Submitted!</b> Your bot is now under review.")
                .parse_mode(ParseMode::Html)
                .await?;
            // Fan out to the moderation team without blocking the submitter
            tokio::spawn(moderation::notify_new_submission(bot.clone(), Arc::clone(&db_pool), submission_id));
        }
        Err(AppError::Duplicate(reason)) => {
            bot.edit_message_text(chat_id, message_id, format!("⚠️ {reason}")).await?;
        }
        Err(e) => return Err(e.into()),
    }

    dialogue.exit().await?;
    Ok(())
}
