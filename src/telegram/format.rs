//! Message rendering and keyboard construction.
//!
//! Every view the bot shows is rebuilt here from freshly fetched rows, so an
//! edit never depends on the text of the message it replaces. All
//! user-supplied text goes through HTML escaping before display.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;
use url::Url;

use crate::core::types::{Category, RejectReason};
use crate::storage::listings::Listing;
use crate::storage::submissions::Submission;
use crate::telegram::callback::CallbackAction;
use crate::telegram::submission::Draft;

/// Deep link to a bot by handle ("@foo" → "https://t.me/foo").
pub fn handle_url(handle: &str) -> String {
    format!("https://t.me/{}", handle.trim_start_matches('@'))
}

/// Link to a channel post, in the private "t.me/c" form that works for
/// channel members ("-100" prefix stripped from the channel id).
pub fn channel_post_url(channel_id: i64, message_id: i32) -> String {
    let clean_id = channel_id.to_string().replace("-100", "");
    format!("https://t.me/c/{clean_id}/{message_id}")
}

fn parsed_url(raw: &str) -> Url {
    // Both URL shapes above are well-formed by construction.
    Url::parse(raw).unwrap_or_else(|_| Url::parse("https://t.me").expect("static URL"))
}

// ── submission conversation ──────────────────────────────────────────────────

pub fn confirmation_text(draft: &Draft) -> String {
    format!(
        "📋 <b>Submission Confirmation</b>\n\n\
         🤖 <b>Bot</b>: {}\n\
         📝 <b>Desc</b>: {}\n\
         ⚙️ <b>Features</b>: {}\n\
         🏷️ <b>Category</b>: {}\n\n\
         Submit this request?",
        escape(&draft.handle),
        escape(&draft.description),
        escape(&draft.features),
        draft.category.as_str(),
    )
}

pub fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Submit", CallbackAction::ConfirmSubmission(true).token()),
        InlineKeyboardButton::callback("❌ Cancel", CallbackAction::ConfirmSubmission(false).token()),
    ]])
}

pub fn category_keyboard() -> InlineKeyboardMarkup {
    let rows = Category::ALL
        .iter()
        .map(|cat| {
            vec![InlineKeyboardButton::callback(
                cat.as_str(),
                CallbackAction::SelectCategory(*cat).token(),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

// ── moderation views ─────────────────────────────────────────────────────────

/// The review card sent to every privileged account, and re-rendered on each
/// claim-state change. `reviewer` is the claim holder's display name.
pub fn review_card_text(sub: &Submission, reviewer: Option<&str>) -> String {
    let status_line = match reviewer {
        Some(name) => format!("Status: 👨‍💼 <b>Being reviewed by</b>: {}", escape(name)),
        None => "Status: ⏳ Awaiting Review".to_string(),
    };
    format!(
        "🆕 <b>NEW BOT SUBMISSION</b> #{}\n\n\
         👤 Submitted by: {}\n\
         🤖 Bot: {}\n\n\
         📝 Desc: {}\n\
         ⚙️ Features: {}\n\
         🏷️ Category: {}\n\n\
         {}",
        sub.id,
        sub.submitted_by,
        escape(&sub.handle),
        escape(&sub.description),
        escape(&sub.features),
        sub.category.as_str(),
        status_line,
    )
}

pub fn claim_keyboard(submission_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "I Will Check ✋",
        CallbackAction::Claim(submission_id).token(),
    )]])
}

pub fn review_keyboard(submission_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("✅ Approve", CallbackAction::Approve(submission_id).token()),
            InlineKeyboardButton::callback("❌ Reject", CallbackAction::RejectMenu(submission_id).token()),
        ],
        vec![InlineKeyboardButton::callback(
            "🔙 Unclaim",
            CallbackAction::Unclaim(submission_id).token(),
        )],
    ])
}

pub fn reject_reason_keyboard(submission_id: i64) -> InlineKeyboardMarkup {
    let mut rows = RejectReason::ALL
        .iter()
        .map(|reason| {
            vec![InlineKeyboardButton::callback(
                reason.label(),
                CallbackAction::Reject(submission_id, *reason).token(),
            )]
        })
        .collect::<Vec<_>>();
    // Back reverts to the claimed view (claim is idempotent for the holder)
    rows.push(vec![InlineKeyboardButton::callback(
        "🔙 Back",
        CallbackAction::Claim(submission_id).token(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

// ── channel post ─────────────────────────────────────────────────────────────

/// The public channel post for a listing. Re-rendered from the row after
/// every vote, keeping the rating keyboard attached.
pub fn channel_post_text(listing: &Listing) -> String {
    format!(
        "<b>{}</b>\n\
         ━━━━━━━━━━━━━━━━━━━━━\n\n\
         <b>📖 Description</b>\n{}\n\n\
         <b>🚀 Features</b>\n{}\n\n\
         ━━━━━━━━━━━━━━━━━━━━━\n\
         <b>📂 Category:</b> #{}\n\
         <b>⭐ Rating:</b> {}/5.0 ({} votes)\n\
         <b>👤 Submitter:</b> <a href=\"tg://user?id={}\">Profile</a>\n\
         ━━━━━━━━━━━━━━━━━━━━━\n\
         🔗 <a href=\"{}\">Start Bot</a>",
        escape(&listing.handle),
        escape(&listing.description),
        escape(&listing.features),
        listing.category.as_str(),
        listing.rating,
        listing.vote_count,
        listing.submitted_by,
        handle_url(&listing.handle),
    )
}

pub fn rating_keyboard(listing_id: i64) -> InlineKeyboardMarkup {
    let star = |score: u8| {
        InlineKeyboardButton::callback(format!("⭐ {score}"), CallbackAction::Rate(listing_id, score).token())
    };
    InlineKeyboardMarkup::new(vec![vec![star(1), star(2), star(3)], vec![star(4), star(5)]])
}

// ── main menu and browsing ───────────────────────────────────────────────────

pub fn main_menu_text(first_name: &str) -> String {
    format!(
        "Welcome to <b>BotLibrary</b>, {}! 🤖\n\n\
         I am a community-driven bot directory. You can discover amazing bots or submit your own!\n\n\
         Would you like to add a bot to our library?",
        escape(first_name),
    )
}

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "➕ Add a Bot",
            CallbackAction::StartSubmission.token(),
        )],
        vec![InlineKeyboardButton::callback(
            "🔍 Browse Library",
            CallbackAction::BrowseMenu.token(),
        )],
        vec![InlineKeyboardButton::callback("ℹ️ Help", CallbackAction::Help.token())],
    ])
}

pub fn help_text() -> String {
    "🤖 <b>BotLibrary Help</b>\n\n\
     <b>For Users:</b>\n\
     /add - Submit a new bot\n\
     /list - Browse the catalog\n\
     /search &lt;query&gt; - Search for bots\n\n\
     <b>For Staff:</b>\n\
     /pending - View open submissions\n\
     /stats - View statistics"
        .to_string()
}

pub fn browse_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🏆 Top Rated",
            CallbackAction::BrowseTop.token(),
        )],
        vec![InlineKeyboardButton::callback(
            "📂 Categories",
            CallbackAction::BrowseCategories.token(),
        )],
        vec![InlineKeyboardButton::callback(
            "🔙 Back",
            CallbackAction::StartBack.token(),
        )],
    ])
}

pub fn categories_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    let mut row: Vec<InlineKeyboardButton> = Vec::new();
    for cat in Category::ALL {
        row.push(InlineKeyboardButton::callback(
            cat.as_str(),
            CallbackAction::BrowseCategory(cat).token(),
        ));
        if row.len() == 2 {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "🔙 Back",
        CallbackAction::BrowseMenu.token(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn back_keyboard(target: CallbackAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("🔙 Back", target.token())]])
}

pub fn top_rated_text(listings: &[Listing]) -> String {
    let mut text = "🏆 <b>Top Rated Bots</b>\n\n".to_string();
    for listing in listings {
        text.push_str(&format!(
            "• {} - ⭐ {} ({})\n",
            escape(&listing.handle),
            listing.rating,
            listing.vote_count,
        ));
    }
    text
}

pub fn category_listing_text(category: Category, listings: &[Listing]) -> String {
    if listings.is_empty() {
        return format!("📂 Category: <b>{}</b>\n\nNo bots found.", category.as_str());
    }
    let mut text = format!("📂 Category: <b>{}</b>\n\n", category.as_str());
    for listing in listings {
        text.push_str(&format!("• {}\n", escape(&listing.handle)));
    }
    text
}

/// One page of the /list catalog with links into the channel when the post
/// reference is known.
pub fn list_page_text(listings: &[Listing], page: i64, total_pages: i64, offset: i64, channel_id: Option<i64>) -> String {
    let mut text = format!("📂 <b>Bot Library</b> (Page {}/{})\n\n", page + 1, total_pages.max(1));
    for (i, listing) in listings.iter().enumerate() {
        let link = match (listing.channel_message_id, channel_id) {
            (Some(message_id), Some(channel)) => channel_post_url(channel, message_id),
            _ => handle_url(&listing.handle),
        };
        text.push_str(&format!(
            "{}. <a href='{}'>{}</a> - ⭐ {}\n",
            offset + i as i64 + 1,
            link,
            escape(&listing.handle),
            listing.rating,
        ));
    }
    text
}

pub fn list_page_keyboard(page: i64, total_pages: i64) -> Option<InlineKeyboardMarkup> {
    let mut nav_row = Vec::new();
    if page > 0 {
        nav_row.push(InlineKeyboardButton::callback(
            "⬅️ Back",
            CallbackAction::ListPage(page - 1).token(),
        ));
    }
    if page < total_pages - 1 {
        nav_row.push(InlineKeyboardButton::callback(
            "Next ➡️",
            CallbackAction::ListPage(page + 1).token(),
        ));
    }
    if nav_row.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(vec![nav_row]))
    }
}

pub fn search_results_text(query: &str, listings: &[Listing]) -> String {
    let mut text = format!("🔍 <b>Top matches for '{}':</b>\n\n", escape(query));
    for listing in listings {
        text.push_str(&format!(
            "🤖 <b>{}</b>\n⭐ {}/5.0 ({} votes)\n\n",
            escape(&listing.handle),
            listing.rating,
            listing.vote_count,
        ));
    }
    text
}

pub fn search_results_keyboard(listings: &[Listing]) -> InlineKeyboardMarkup {
    let rows = listings
        .iter()
        .map(|listing| {
            vec![InlineKeyboardButton::url(
                format!("🔗 {} ({}⭐)", listing.handle, listing.rating),
                parsed_url(&handle_url(&listing.handle)),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

// ── staff views ──────────────────────────────────────────────────────────────

pub fn pending_queue_text(subs: &[Submission], open_total: i64) -> String {
    if subs.is_empty() {
        return "⏳ <b>Open Submissions</b>\n\nThe review queue is empty. 🎉".to_string();
    }
    let mut text = format!("⏳ <b>Open Submissions</b> ({open_total} total)\n\n");
    for sub in subs {
        let claim_note = match sub.claimed_by {
            Some(reviewer) => format!(" — claimed by {reviewer}"),
            None => String::new(),
        };
        text.push_str(&format!(
            "#{} {} [{}]{}\n",
            sub.id,
            escape(&sub.handle),
            sub.category.as_str(),
            claim_note,
        ));
    }
    text
}

pub fn pending_queue_keyboard(subs: &[Submission]) -> Option<InlineKeyboardMarkup> {
    let rows = subs
        .iter()
        .filter(|sub| sub.claimed_by.is_none())
        .map(|sub| {
            vec![InlineKeyboardButton::callback(
                format!("✋ Claim #{} {}", sub.id, sub.handle),
                CallbackAction::Claim(sub.id).token(),
            )]
        })
        .collect::<Vec<_>>();
    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

pub fn stats_text(accounts: i64, listings: i64, open: i64, per_category: &[(Category, i64)]) -> String {
    let category_lines = per_category
        .iter()
        .map(|(cat, count)| format!("• {}: {}", cat.as_str(), count))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "📊 <b>System Statistics</b>\n\n\
         👥 Total Users: {accounts}\n\
         🤖 Approved Bots: {listings}\n\
         ⏳ Pending Reviews: {open}\n\n\
         📂 <b>Categories</b>:\n{category_lines}"
    )
}

pub fn broadcast_text(message: &str) -> String {
    format!("📢 <b>ANNOUNCEMENT</b>\n\n{}", escape(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SubmissionStatus;
    use std::collections::BTreeMap;

    fn sample_listing() -> Listing {
        Listing {
            id: 3,
            submission_id: 1,
            handle: "@mybot".to_string(),
            description: "A <cool> bot".to_string(),
            features: "Does X & Y".to_string(),
            category: Category::Utility,
            rating: 4.5,
            vote_count: 2,
            votes: BTreeMap::new(),
            submitted_by: 100,
            approved_by: 7,
            submitted_at: "2024-01-01 00:00:00".to_string(),
            approved_at: "2024-01-02 00:00:00".to_string(),
            channel_message_id: Some(55),
        }
    }

    fn sample_submission() -> Submission {
        Submission {
            id: 9,
            handle: "@mybot".to_string(),
            description: "A <cool> bot".to_string(),
            features: "Does X & Y".to_string(),
            category: Category::Utility,
            submitted_by: 100,
            submitted_at: "2024-01-01 00:00:00".to_string(),
            status: SubmissionStatus::Pending,
            rejection_reason: None,
            claimed_by: None,
            claimed_at: None,
        }
    }

    #[test]
    fn channel_post_escapes_user_text() {
        let text = channel_post_text(&sample_listing());
        assert!(text.contains("A &lt;cool&gt; bot"));
        assert!(text.contains("Does X &amp; Y"));
        assert!(text.contains("4.5/5.0 (2 votes)"));
        assert!(text.contains("#Utility"));
        assert!(text.contains("https://t.me/mybot"));
    }

    #[test]
    fn review_card_shows_claim_state() {
        let sub = sample_submission();
        let open = review_card_text(&sub, None);
        assert!(open.contains("Awaiting Review"));

        let claimed = review_card_text(&sub, Some("mod<1>"));
        assert!(claimed.contains("Being reviewed by"));
        assert!(claimed.contains("mod&lt;1&gt;"), "reviewer name must be escaped");
    }

    #[test]
    fn channel_post_url_strips_supergroup_prefix() {
        assert_eq!(channel_post_url(-1001234567890, 55), "https://t.me/c/1234567890/55");
    }

    #[test]
    fn handle_url_strips_at() {
        assert_eq!(handle_url("@foo"), "https://t.me/foo");
        assert_eq!(handle_url("foo"), "https://t.me/foo");
    }

    #[test]
    fn list_page_prefers_channel_link() {
        let listing = sample_listing();
        let with_channel = list_page_text(std::slice::from_ref(&listing), 0, 1, 0, Some(-1001234567890));
        assert!(with_channel.contains("t.me/c/1234567890/55"));

        let without_channel = list_page_text(&[listing], 0, 1, 0, None);
        assert!(without_channel.contains("t.me/mybot"));
    }

    #[test]
    fn list_page_keyboard_edges() {
        assert!(list_page_keyboard(0, 1).is_none(), "single page needs no nav");

        let first = list_page_keyboard(0, 3).unwrap();
        assert_eq!(first.inline_keyboard[0].len(), 1, "first page: only Next");

        let middle = list_page_keyboard(1, 3).unwrap();
        assert_eq!(middle.inline_keyboard[0].len(), 2, "middle page: Back and Next");
    }

    #[test]
    fn category_keyboard_covers_all_categories() {
        let kb = category_keyboard();
        assert_eq!(kb.inline_keyboard.len(), Category::ALL.len());
    }

    #[test]
    fn reject_menu_has_all_reasons_plus_back() {
        let kb = reject_reason_keyboard(9);
        assert_eq!(kb.inline_keyboard.len(), RejectReason::ALL.len() + 1);
    }

    #[test]
    fn pending_queue_omits_claim_buttons_for_claimed_rows() {
        let mut claimed = sample_submission();
        claimed.claimed_by = Some(7);
        let open = sample_submission();

        let kb = pending_queue_keyboard(&[claimed, open]).unwrap();
        assert_eq!(kb.inline_keyboard.len(), 1);
    }
}
