//! Bot command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use dompet_core::{
    Bot, CompletionBackend, Config, SummaryQuery, TelegramClient, TransactionPipeline,
};
use tracing::{info, warn};

use super::http_client;

/// Start the bot and poll until Ctrl-C
pub async fn cmd_run(config: &Config) -> Result<()> {
    let http = http_client();
    let telegram = TelegramClient::new(&config.bot_token, http.clone());

    let me = telegram
        .get_me()
        .await
        .context("Could not reach Telegram (check BOT_TOKEN)")?;
    info!(
        "Connected to Telegram as @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let pipeline = TransactionPipeline::from_config(config, http);
    if !pipeline.backend().health_check().await {
        warn!(
            "Ollama at {} is not responding; messages will fail until it is up",
            pipeline.backend().host()
        );
    }

    let summaries = SummaryQuery::new(pipeline.store().clone());
    let bot = Bot::new(pipeline, summaries, Arc::new(telegram.clone()));

    info!(
        "Only user {} may record transactions (model {})",
        config.authorized_user_id, config.ollama_model
    );

    tokio::select! {
        _ = bot.run(&telegram, config.timeouts.poll) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
    }

    Ok(())
}
