//! Bot initialization and command definitions.

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can do this:")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "how the directory works")]
    Help,
    #[command(description = "submit a bot for listing")]
    Add,
    #[command(description = "cancel the current submission")]
    Cancel,
    #[command(description = "browse the catalog page by page")]
    List,
    #[command(description = "search listed bots")]
    Search(String),
    #[command(description = "open submissions (staff)")]
    Pending,
    #[command(description = "directory statistics (staff)")]
    Stats,
    #[command(description = "message every known user (staff)")]
    Broadcast(String),
    #[command(description = "promote an account to sudo (owner)")]
    AddSudo(String),
    #[command(description = "demote a sudo account (owner)")]
    RemoveSudo(String),
    #[command(description = "promote an account to moderator (staff)")]
    AddMod(String),
    #[command(description = "demote a moderator (staff)")]
    RemoveMod(String),
    #[command(description = "remove a listing and its post (staff)")]
    DeleteBot(String),
}

/// Creates a Bot instance from the configured token.
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - BOT_TOKEN is missing
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN is not set; refusing to start");
    }
    Ok(Bot::new(token))
}

/// Sets up the public command list in the Telegram UI.
///
/// Staff-only commands are registered too; they refuse unauthorized callers
/// at dispatch time, the same place the privilege actually matters.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "show the main menu"),
        BotCommand::new("help", "how the directory works"),
        BotCommand::new("add", "submit a bot for listing"),
        BotCommand::new("cancel", "cancel the current submission"),
        BotCommand::new("list", "browse the catalog page by page"),
        BotCommand::new("search", "search listed bots"),
    ])
    .await?;

    Ok(())
}
