//! Typed decoding of inline-keyboard callback tokens.
//!
//! Every button payload is parsed here into a `CallbackAction` before any
//! handler sees it. Malformed or unknown tokens decode to `None` and are
//! answered with a silent ack at the dispatch boundary, never an error.

use std::str::FromStr;

use crate::core::types::{Category, RejectReason};

/// A decoded button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// ➕ Add a Bot — entry into the submission conversation
    StartSubmission,
    /// Category picked during submission
    SelectCategory(Category),
    /// Submission confirmation: true = submit, false = discard
    ConfirmSubmission(bool),
    /// Reviewer takes a submission
    Claim(i64),
    /// Reviewer releases a submission
    Unclaim(i64),
    /// Reviewer approves a submission
    Approve(i64),
    /// Reviewer opens the rejection reason menu
    RejectMenu(i64),
    /// Reviewer rejects with a chosen reason
    Reject(i64, RejectReason),
    /// Channel reader rates a listing 1–5
    Rate(i64, u8),
    /// Main menu: browse entry
    BrowseMenu,
    /// Browse: top rated view
    BrowseTop,
    /// Browse: category keyboard
    BrowseCategories,
    /// Browse: listings of one category
    BrowseCategory(Category),
    /// Catalog page navigation
    ListPage(i64),
    /// Main menu: help view
    Help,
    /// Back to the main menu
    StartBack,
}

impl CallbackAction {
    /// Parse a raw callback token. Unknown or malformed tokens yield `None`.
    pub fn parse(data: &str) -> Option<CallbackAction> {
        if let Some(rest) = data.strip_prefix("cat_") {
            return Category::from_str(rest).ok().map(CallbackAction::SelectCategory);
        }
        if let Some(rest) = data.strip_prefix("list_cat_") {
            return Category::from_str(rest).ok().map(CallbackAction::BrowseCategory);
        }
        if let Some(rest) = data.strip_prefix("list_page_") {
            return rest.parse().ok().map(CallbackAction::ListPage);
        }
        if let Some(rest) = data.strip_prefix("mod_claim_") {
            return rest.parse().ok().map(CallbackAction::Claim);
        }
        if let Some(rest) = data.strip_prefix("mod_unclaim_") {
            return rest.parse().ok().map(CallbackAction::Unclaim);
        }
        if let Some(rest) = data.strip_prefix("mod_approve_") {
            return rest.parse().ok().map(CallbackAction::Approve);
        }
        if let Some(rest) = data.strip_prefix("mod_reject_") {
            // Either "<id>" (open the menu) or "<id>_<code>" (final decision)
            return match rest.split_once('_') {
                None => rest.parse().ok().map(CallbackAction::RejectMenu),
                Some((id, code)) => {
                    let id = id.parse().ok()?;
                    let reason = RejectReason::from_code(code)?;
                    Some(CallbackAction::Reject(id, reason))
                }
            };
        }
        if let Some(rest) = data.strip_prefix("rate_") {
            let (id, score) = rest.split_once('_')?;
            let id = id.parse().ok()?;
            let score: u8 = score.parse().ok()?;
            if !(1..=5).contains(&score) {
                return None;
            }
            return Some(CallbackAction::Rate(id, score));
        }

        match data {
            "add_bot" => Some(CallbackAction::StartSubmission),
            "submit_yes" => Some(CallbackAction::ConfirmSubmission(true)),
            "submit_no" => Some(CallbackAction::ConfirmSubmission(false)),
            "browse_bots" => Some(CallbackAction::BrowseMenu),
            "browse_top" => Some(CallbackAction::BrowseTop),
            "browse_cats" => Some(CallbackAction::BrowseCategories),
            "help" => Some(CallbackAction::Help),
            "start_back" => Some(CallbackAction::StartBack),
            _ => None,
        }
    }

    /// Encode the action back into its wire token (used when building
    /// keyboards, so encode and parse cannot drift apart).
    pub fn token(&self) -> String {
        match self {
            CallbackAction::StartSubmission => "add_bot".to_string(),
            CallbackAction::SelectCategory(cat) => format!("cat_{cat}"),
            CallbackAction::ConfirmSubmission(true) => "submit_yes".to_string(),
            CallbackAction::ConfirmSubmission(false) => "submit_no".to_string(),
            CallbackAction::Claim(id) => format!("mod_claim_{id}"),
            CallbackAction::Unclaim(id) => format!("mod_unclaim_{id}"),
            CallbackAction::Approve(id) => format!("mod_approve_{id}"),
            CallbackAction::RejectMenu(id) => format!("mod_reject_{id}"),
            CallbackAction::Reject(id, reason) => format!("mod_reject_{id}_{}", reason.code()),
            CallbackAction::Rate(id, score) => format!("rate_{id}_{score}"),
            CallbackAction::BrowseMenu => "browse_bots".to_string(),
            CallbackAction::BrowseTop => "browse_top".to_string(),
            CallbackAction::BrowseCategories => "browse_cats".to_string(),
            CallbackAction::BrowseCategory(cat) => format!("list_cat_{cat}"),
            CallbackAction::ListPage(page) => format!("list_page_{page}"),
            CallbackAction::Help => "help".to_string(),
            CallbackAction::StartBack => "start_back".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_moderation_tokens() {
        assert_eq!(CallbackAction::parse("mod_claim_7"), Some(CallbackAction::Claim(7)));
        assert_eq!(CallbackAction::parse("mod_unclaim_7"), Some(CallbackAction::Unclaim(7)));
        assert_eq!(CallbackAction::parse("mod_approve_12"), Some(CallbackAction::Approve(12)));
        assert_eq!(CallbackAction::parse("mod_reject_12"), Some(CallbackAction::RejectMenu(12)));
        assert_eq!(
            CallbackAction::parse("mod_reject_12_spam"),
            Some(CallbackAction::Reject(12, RejectReason::Spam))
        );
    }

    #[test]
    fn parse_rating_tokens() {
        assert_eq!(CallbackAction::parse("rate_3_4"), Some(CallbackAction::Rate(3, 4)));
        assert_eq!(CallbackAction::parse("rate_3_0"), None, "score below range");
        assert_eq!(CallbackAction::parse("rate_3_6"), None, "score above range");
        assert_eq!(CallbackAction::parse("rate_3"), None, "missing score");
    }

    #[test]
    fn parse_submission_tokens() {
        assert_eq!(CallbackAction::parse("add_bot"), Some(CallbackAction::StartSubmission));
        assert_eq!(
            CallbackAction::parse("cat_Utility"),
            Some(CallbackAction::SelectCategory(Category::Utility))
        );
        assert_eq!(
            CallbackAction::parse("submit_yes"),
            Some(CallbackAction::ConfirmSubmission(true))
        );
        assert_eq!(
            CallbackAction::parse("submit_no"),
            Some(CallbackAction::ConfirmSubmission(false))
        );
    }

    #[test]
    fn parse_browse_tokens() {
        assert_eq!(
            CallbackAction::parse("list_cat_Gaming"),
            Some(CallbackAction::BrowseCategory(Category::Gaming))
        );
        assert_eq!(CallbackAction::parse("list_page_2"), Some(CallbackAction::ListPage(2)));
    }

    #[test]
    fn malformed_tokens_parse_to_none() {
        for token in [
            "",
            "bogus",
            "mod_claim_",
            "mod_claim_abc",
            "mod_reject_12_unknown",
            "cat_Music",
            "list_cat_",
            "rate__5",
            "rate_1_abc",
        ] {
            assert_eq!(CallbackAction::parse(token), None, "token {token:?} must not parse");
        }
    }

    #[test]
    fn token_round_trips_through_parse() {
        let actions = [
            CallbackAction::StartSubmission,
            CallbackAction::SelectCategory(Category::Social),
            CallbackAction::ConfirmSubmission(true),
            CallbackAction::ConfirmSubmission(false),
            CallbackAction::Claim(7),
            CallbackAction::Unclaim(7),
            CallbackAction::Approve(7),
            CallbackAction::RejectMenu(7),
            CallbackAction::Reject(7, RejectReason::InsufficientDescription),
            CallbackAction::Rate(3, 5),
            CallbackAction::BrowseMenu,
            CallbackAction::BrowseTop,
            CallbackAction::BrowseCategories,
            CallbackAction::BrowseCategory(Category::Other),
            CallbackAction::ListPage(0),
            CallbackAction::Help,
            CallbackAction::StartBack,
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(&action.token()), Some(action));
        }
    }
}
