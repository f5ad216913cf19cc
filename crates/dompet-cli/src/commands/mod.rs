//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `bot` - Run the Telegram bot
//! - `parse` - Local parsing and prompt inspection
//! - `summary` - Daily and all-time summaries
//! - `check` - Configuration and connectivity report

pub mod bot;
pub mod check;
pub mod parse;
pub mod summary;

// Re-export command functions for main.rs
pub use bot::*;
pub use check::*;
pub use parse::*;
pub use summary::*;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use dompet_core::Config;
use tracing::error;

/// Read the configuration, logging a fatal line when it is incomplete
pub fn load_config() -> Result<Config> {
    Config::from_env()
        .map_err(|e| {
            error!("{}. Please check your .env file.", e);
            e
        })
        .context("Configuration is incomplete")
}

/// Parse a `--date` argument, defaulting to today
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s)),
        None => Ok(Local::now().date_naive()),
    }
}

/// One connection pool shared by every collaborator
pub fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}
