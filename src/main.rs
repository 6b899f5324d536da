use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use botlibrary::core::{config, health, init_logger};
use botlibrary::storage::create_pool;
use botlibrary::telegram::submission::SubmitState;
use botlibrary::telegram::{create_bot, schema, setup_bot_commands};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    log::info!("Starting BotLibrary...");

    // Missing token is fatal before anything else spins up
    let bot = create_bot()?;

    if *config::OWNER_ID == 0 {
        log::warn!("OWNER_ID is not set; owner-only commands are disabled");
    }
    if config::CHANNEL_ID.is_none() {
        log::warn!("CHANNEL_ID is not set; approved listings will not be published");
    }
    log::info!("Configured sudo accounts: {}", config::SUDO_USERS.len());

    // Create database connection pool (runs schema setup)
    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    log::info!("Database ready at {}", config::DATABASE_PATH.as_str());

    // Register the public command list; not worth failing startup over
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    // Liveness endpoint for uptime probes
    let health_port = *config::health::PORT;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_port).await {
            log::error!("Health server error: {}", e);
        }
    });

    log::info!("Bot is polling...");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![Arc::clone(&db_pool), InMemStorage::<SubmitState>::new()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Shutting down.");
    Ok(())
}
