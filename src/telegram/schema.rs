//! Dispatcher schema: commands, dialogue states, and the callback boundary.
//!
//! The same tree is used in production and can be driven by tests; callback
//! tokens are decoded into `CallbackAction` here, before any engine runs.

use std::sync::Arc;

use teloxide::dispatching::{dialogue, dialogue::InMemStorage, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::storage::DbPool;
use crate::telegram::bot::Command;
use crate::telegram::callback::CallbackAction;
use crate::telegram::submission::{self, SubmitState};
use crate::telegram::{admin, browse, moderation, rating};
use crate::telegram::{HandlerError, HandlerResult, SubmitDialogue};

/// Creates the dispatcher handler tree.
pub fn schema() -> UpdateHandler<HandlerError> {
    let command_handler = dptree::entry().filter_command::<Command>().endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::case![SubmitState::AwaitingHandle].endpoint(submission::receive_handle))
        .branch(dptree::case![SubmitState::AwaitingDescription { handle }].endpoint(submission::receive_description))
        .branch(
            dptree::case![SubmitState::AwaitingFeatures { handle, description }]
                .endpoint(submission::receive_features),
        );

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback);

    dialogue::enter::<Update, InMemStorage<SubmitState>, SubmitState, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: SubmitDialogue,
    db_pool: Arc<DbPool>,
) -> HandlerResult {
    log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);

    match cmd {
        Command::Start => browse::handle_start(bot, msg, db_pool).await,
        Command::Help => browse::handle_help(bot, msg).await,
        Command::Add => submission::start_submission(bot, dialogue, msg.chat.id).await,
        Command::Cancel => submission::cancel(bot, dialogue, msg).await,
        Command::List => browse::handle_list(bot, msg, db_pool).await,
        Command::Search(query) => browse::handle_search(bot, msg, db_pool, query).await,
        Command::Pending => admin::handle_pending(bot, msg, db_pool).await,
        Command::Stats => admin::handle_stats(bot, msg, db_pool).await,
        Command::Broadcast(text) => admin::handle_broadcast(bot, msg, db_pool, text).await,
        Command::AddSudo(arg) => admin::handle_add_sudo(bot, msg, db_pool, arg).await,
        Command::RemoveSudo(arg) => admin::handle_remove_sudo(bot, msg, db_pool, arg).await,
        Command::AddMod(arg) => admin::handle_add_mod(bot, msg, db_pool, arg).await,
        Command::RemoveMod(arg) => admin::handle_remove_mod(bot, msg, db_pool, arg).await,
        Command::DeleteBot(arg) => admin::handle_delete_bot(bot, msg, db_pool, arg).await,
    }
}

async fn handle_callback(bot: Bot, q: CallbackQuery, dialogue: SubmitDialogue, db_pool: Arc<DbPool>) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(&data) else {
        log::warn!("Ignoring malformed callback token: {:?}", data);
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };

    let message_ref = q.message.as_ref().map(|m| (m.chat().id, m.id()));

    // Moderation and rating answer their own callback queries; the
    // navigation actions are acked right here.
    match action {
        CallbackAction::Claim(id) => return moderation::handle_claim(bot, q, db_pool, id).await,
        CallbackAction::Unclaim(id) => return moderation::handle_unclaim(bot, q, db_pool, id).await,
        CallbackAction::Approve(id) => return moderation::handle_approve(bot, q, db_pool, id).await,
        CallbackAction::RejectMenu(id) => return moderation::handle_reject_menu(bot, q, db_pool, id).await,
        CallbackAction::Reject(id, reason) => return moderation::handle_reject(bot, q, db_pool, id, reason).await,
        CallbackAction::Rate(id, score) => return rating::handle_rate(bot, q, db_pool, id, score).await,
        _ => {}
    }

    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        log::warn!("Failed to answer callback query: {}", e);
    }
    let Some((chat_id, message_id)) = message_ref else {
        return Ok(());
    };

    match action {
        CallbackAction::StartSubmission => submission::start_submission(bot, dialogue, chat_id).await,
        CallbackAction::SelectCategory(category) => {
            submission::category_selected(bot, dialogue, chat_id, message_id, category).await
        }
        CallbackAction::ConfirmSubmission(submit) => {
            let submitter = i64::try_from(q.from.id.0).unwrap_or(0);
            let username = q.from.username.clone();
            submission::confirmation_answered(
                bot, dialogue, db_pool, chat_id, message_id, submitter, username, submit,
            )
            .await
        }
        CallbackAction::BrowseMenu => browse::show_browse_menu(bot, chat_id, message_id).await,
        CallbackAction::BrowseTop => browse::show_top_rated(bot, chat_id, message_id, db_pool).await,
        CallbackAction::BrowseCategories => browse::show_categories(bot, chat_id, message_id).await,
        CallbackAction::BrowseCategory(category) => {
            browse::show_category(bot, chat_id, message_id, db_pool, category).await
        }
        CallbackAction::ListPage(page) => browse::show_list_page(bot, chat_id, message_id, db_pool, page).await,
        CallbackAction::Help => browse::show_help(bot, chat_id, message_id).await,
        CallbackAction::StartBack => browse::show_start_menu(bot, chat_id, message_id, &q.from.first_name).await,
        // Handled above
        CallbackAction::Claim(_)
        | CallbackAction::Unclaim(_)
        | CallbackAction::Approve(_)
        | CallbackAction::RejectMenu(_)
        | CallbackAction::Reject(..)
        | CallbackAction::Rate(..) => Ok(()),
    }
}
