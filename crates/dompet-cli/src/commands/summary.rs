//! Summary command implementations

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use dompet_core::render;
use dompet_core::{AppsScriptStore, Config, SummaryQuery};

use super::http_client;

fn summary_query(config: &Config) -> SummaryQuery {
    let store = AppsScriptStore::with_client(
        http_client(),
        &config.app_script_url,
        config.timeouts.persist,
        config.timeouts.query,
    );
    SummaryQuery::new(Arc::new(store))
}

/// Rendered daily summary, as the bot would send it
pub async fn daily_report(config: &Config, date: NaiveDate) -> String {
    render::daily(&summary_query(config).daily(date).await).text
}

/// Rendered all-time summary, as the bot would send it
pub async fn balance_report(config: &Config) -> String {
    render::all_time(&summary_query(config).all_time().await).text
}

pub async fn cmd_daily(config: &Config, date: NaiveDate) -> Result<()> {
    println!("{}", daily_report(config, date).await);
    Ok(())
}

pub async fn cmd_balance(config: &Config) -> Result<()> {
    println!("{}", balance_report(config).await);
    Ok(())
}
