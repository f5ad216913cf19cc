//! Dompet CLI - Chat-driven personal finance logger
//!
//! Usage:
//!   dompet run                       Start the Telegram bot
//!   dompet parse "25K nasi goreng"   Parse a transaction locally
//!   dompet daily --date 2024-05-01   Show a daily summary
//!   dompet balance                   Show all-time totals
//!   dompet check                     Check configuration and connectivity

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

/// Default log directives when RUST_LOG is not set
///
/// HTTP client internals stay at warn either way.
pub fn default_log_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{},hyper=warn,hyper_util=warn,reqwest=warn", level)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_log_filter(cli.verbose))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Run => {
            let config = commands::load_config()?;
            commands::cmd_run(&config).await
        }
        Commands::Parse { text, save, json } => {
            let config = commands::load_config()?;
            commands::cmd_parse(&config, &text, save, json).await
        }
        Commands::Prompt { text } => commands::cmd_prompt(&text),
        Commands::Daily { date } => {
            let config = commands::load_config()?;
            let date = commands::resolve_date(date.as_deref())?;
            commands::cmd_daily(&config, date).await
        }
        Commands::Balance => {
            let config = commands::load_config()?;
            commands::cmd_balance(&config).await
        }
        Commands::Check => commands::cmd_check().await,
    }
}
