//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};

/// Dompet - Log personal finances by chatting with a Telegram bot
#[derive(Parser)]
#[command(name = "dompet")]
#[command(about = "Chat-driven personal finance logger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Telegram bot (long polling)
    Run,

    /// Parse a transaction description without going through Telegram
    Parse {
        /// Transaction description, e.g. "25K nasi goreng via ShopeePay"
        text: String,

        /// Also append the parsed record to the spreadsheet
        #[arg(long)]
        save: bool,

        /// Print the parsed record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt that would be sent to the model
    Prompt {
        /// Transaction description
        text: String,
    },

    /// Show the daily expense summary
    Daily {
        /// Date to summarize (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show all-time income, expense and remaining cash
    Balance,

    /// Check configuration and connectivity to Ollama, Telegram and the spreadsheet
    Check,
}
