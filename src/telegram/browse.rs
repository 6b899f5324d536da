//! Public catalog surface: main menu, browsing, /list pagination, /search.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use crate::core::config;
use crate::core::types::Category;
use crate::storage::{accounts, get_connection, listings, DbPool};
use crate::telegram::callback::CallbackAction;
use crate::telegram::format;
use crate::telegram::HandlerResult;

/// /start — creates the account lazily and shows the main menu.
pub async fn handle_start(bot: Bot, msg: Message, db_pool: Arc<DbPool>) -> HandlerResult {
    if let Some(user_id) = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()) {
        let username = msg.from.as_ref().and_then(|u| u.username.as_deref());
        let conn = get_connection(&db_pool)?;
        accounts::ensure_account(&conn, user_id, username)?;
    }

    let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("there");
    bot.send_message(msg.chat.id, format::main_menu_text(first_name))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::main_menu_keyboard())
        .await?;
    Ok(())
}

/// /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, format::help_text())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

// ── in-place menu views (callback-driven) ────────────────────────────────────

pub async fn show_help(bot: Bot, chat_id: ChatId, message_id: MessageId) -> HandlerResult {
    bot.edit_message_text(chat_id, message_id, format::help_text())
        .parse_mode(ParseMode::Html)
        .reply_markup(format::back_keyboard(CallbackAction::StartBack))
        .await?;
    Ok(())
}

pub async fn show_start_menu(bot: Bot, chat_id: ChatId, message_id: MessageId, first_name: &str) -> HandlerResult {
    bot.edit_message_text(chat_id, message_id, format::main_menu_text(first_name))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::main_menu_keyboard())
        .await?;
    Ok(())
}

pub async fn show_browse_menu(bot: Bot, chat_id: ChatId, message_id: MessageId) -> HandlerResult {
    bot.edit_message_text(chat_id, message_id, "🔍 <b>Browse Library</b>\nSelect a filter:")
        .parse_mode(ParseMode::Html)
        .reply_markup(format::browse_menu_keyboard())
        .await?;
    Ok(())
}

pub async fn show_top_rated(bot: Bot, chat_id: ChatId, message_id: MessageId, db_pool: Arc<DbPool>) -> HandlerResult {
    let top = {
        let conn = get_connection(&db_pool)?;
        listings::top_rated(&conn, config::catalog::TOP_LIMIT)?
    };

    if top.is_empty() {
        bot.edit_message_text(chat_id, message_id, "No bots found!")
            .reply_markup(format::back_keyboard(CallbackAction::BrowseMenu))
            .await?;
        return Ok(());
    }

    bot.edit_message_text(chat_id, message_id, format::top_rated_text(&top))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::back_keyboard(CallbackAction::BrowseMenu))
        .await?;
    Ok(())
}

pub async fn show_categories(bot: Bot, chat_id: ChatId, message_id: MessageId) -> HandlerResult {
    bot.edit_message_text(chat_id, message_id, "📂 <b>Select Category</b>:")
        .parse_mode(ParseMode::Html)
        .reply_markup(format::categories_keyboard())
        .await?;
    Ok(())
}

pub async fn show_category(
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    db_pool: Arc<DbPool>,
    category: Category,
) -> HandlerResult {
    let entries = {
        let conn = get_connection(&db_pool)?;
        listings::listings_by_category(&conn, category, config::catalog::CATEGORY_LIMIT)?
    };

    bot.edit_message_text(chat_id, message_id, format::category_listing_text(category, &entries))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::back_keyboard(CallbackAction::BrowseCategories))
        .await?;
    Ok(())
}

// ── /list pagination ─────────────────────────────────────────────────────────

struct CatalogPage {
    text: String,
    keyboard: Option<teloxide::types::InlineKeyboardMarkup>,
}

fn render_page(db_pool: &DbPool, page: i64) -> Result<CatalogPage, crate::core::error::AppError> {
    let page_size = config::catalog::PAGE_SIZE;
    let conn = get_connection(db_pool)?;

    let total = listings::listing_count(&conn)?;
    if total == 0 {
        return Ok(CatalogPage {
            text: "📂 <b>Bot Library</b>\n\nNo bots found.".to_string(),
            keyboard: None,
        });
    }

    let total_pages = (total + page_size - 1) / page_size;
    let page = page.clamp(0, total_pages - 1);
    let offset = page * page_size;
    let entries = listings::listings_page(&conn, offset, page_size)?;

    Ok(CatalogPage {
        text: format::list_page_text(&entries, page, total_pages, offset, *config::CHANNEL_ID),
        keyboard: format::list_page_keyboard(page, total_pages),
    })
}

/// /list command — sends the first page as a new message.
pub async fn handle_list(bot: Bot, msg: Message, db_pool: Arc<DbPool>) -> HandlerResult {
    let page = render_page(&db_pool, 0)?;
    let mut request = bot.send_message(msg.chat.id, page.text).parse_mode(ParseMode::Html);
    if let Some(keyboard) = page.keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

/// Pagination button — edits the existing catalog message in place.
pub async fn show_list_page(
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    db_pool: Arc<DbPool>,
    page: i64,
) -> HandlerResult {
    let rendered = render_page(&db_pool, page)?;
    let mut request = bot
        .edit_message_text(chat_id, message_id, rendered.text)
        .parse_mode(ParseMode::Html);
    if let Some(keyboard) = rendered.keyboard {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

// ── /search ──────────────────────────────────────────────────────────────────

pub async fn handle_search(bot: Bot, msg: Message, db_pool: Arc<DbPool>, query: String) -> HandlerResult {
    let query = query.trim().to_string();
    if query.is_empty() {
        bot.send_message(msg.chat.id, "🔍 Usage: /search <bot name or description>")
            .await?;
        return Ok(());
    }

    let results = {
        let conn = get_connection(&db_pool)?;
        listings::search_listings(&conn, &query, config::catalog::SEARCH_LIMIT)?
    };

    if results.is_empty() {
        bot.send_message(
            msg.chat.id,
            format!(
                "❌ No bots found matching '<b>{}</b>'.",
                teloxide::utils::html::escape(&query)
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, format::search_results_text(&query, &results))
        .parse_mode(ParseMode::Html)
        .reply_markup(format::search_results_keyboard(&results))
        .await?;
    Ok(())
}
