//! Check command implementation

use anyhow::{anyhow, bail, Result};
use dompet_core::config::{
    ENV_APP_SCRIPT_URL, ENV_AUTHORIZED_USER_ID, ENV_BOT_TOKEN, ENV_OLLAMA_MODEL, ENV_OLLAMA_URL,
};
use dompet_core::{
    AllTimeSummaryOutcome, CompletionBackend, Config, Error, SummaryQuery, TelegramClient,
    TransactionPipeline,
};

use super::http_client;

/// Report configuration and reachability of every collaborator
pub async fn cmd_check() -> Result<()> {
    println!("🔍 Checking Dompet configuration...\n");

    let config = config_status(Config::from_env())?;

    println!("  {:<20} {}", ENV_OLLAMA_URL, config.ollama_url);
    println!("  {:<20} {}", ENV_OLLAMA_MODEL, config.ollama_model);
    println!("  {:<20} ***", ENV_BOT_TOKEN);
    println!("  {:<20} {}", ENV_APP_SCRIPT_URL, config.app_script_url);
    println!("  {:<20} {}", ENV_AUTHORIZED_USER_ID, config.authorized_user_id);
    println!(
        "  Timeouts             completion {}s, persist {}s, query {}s\n",
        config.timeouts.completion.as_secs(),
        config.timeouts.persist.as_secs(),
        config.timeouts.query.as_secs()
    );

    let telegram = TelegramClient::new(&config.bot_token, http_client());
    for line in connectivity_report(&config, &telegram).await {
        println!("{}", line);
    }

    Ok(())
}

/// Print what is wrong with the configuration and fail, or pass it through
pub fn config_status(loaded: dompet_core::Result<Config>) -> Result<Config> {
    match loaded {
        Ok(config) => Ok(config),
        Err(Error::MissingConfig(missing)) => {
            for key in [
                ENV_OLLAMA_URL,
                ENV_OLLAMA_MODEL,
                ENV_BOT_TOKEN,
                ENV_APP_SCRIPT_URL,
                ENV_AUTHORIZED_USER_ID,
            ] {
                let status = if missing.iter().any(|m| m == key) {
                    "❌ missing"
                } else {
                    "✅ set"
                };
                println!("  {:<20} {}", key, status);
            }
            println!("\n⚠️  Set the missing variables in the environment or in .env");
            bail!("Missing required environment variables: {}", missing.join(", "))
        }
        Err(e) => {
            println!("  ❌ {}", e);
            Err(anyhow!(e).context("Configuration is invalid"))
        }
    }
}

/// One line per collaborator
pub async fn connectivity_report(config: &Config, telegram: &TelegramClient) -> Vec<String> {
    let pipeline = TransactionPipeline::from_config(config, http_client());
    let mut lines = Vec::new();

    if pipeline.backend().health_check().await {
        lines.push(format!("  Ollama:      ✅ reachable ({})", config.ollama_model));
    } else {
        lines.push(format!(
            "  Ollama:      ❌ not responding at {}",
            pipeline.backend().host()
        ));
    }

    match telegram.get_me().await {
        Ok(me) => lines.push(format!(
            "  Telegram:    ✅ @{}",
            me.username.as_deref().unwrap_or(&me.first_name)
        )),
        Err(e) => lines.push(format!("  Telegram:    ❌ {}", e)),
    }

    match SummaryQuery::new(pipeline.store().clone()).all_time().await {
        AllTimeSummaryOutcome::Report(_) => lines.push("  Spreadsheet: ✅ reachable".to_string()),
        AllTimeSummaryOutcome::Failed(e) => lines.push(format!("  Spreadsheet: ❌ {}", e)),
    }

    lines
}
