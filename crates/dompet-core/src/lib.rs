//! Dompet Core Library
//!
//! Shared functionality for the Dompet chat-driven finance logger:
//! - Prompt construction for transaction parsing
//! - Pluggable completion backends (Ollama, mock)
//! - Tolerant JSON extraction and record validation
//! - Spreadsheet persistence through an Apps Script webhook
//! - Transaction pipeline and read-side summaries
//! - Telegram transport and bot dispatcher

pub mod ai;
pub mod bot;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod sheets;
pub mod summary;
pub mod telegram;
pub mod validate;

/// Test utilities including mock Ollama, spreadsheet and Telegram servers
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    extract_fields, CompletionBackend, CompletionError, ExtractError, Fields, MockBackend,
    OllamaBackend,
};
pub use bot::Bot;
pub use config::{Config, Timeouts};
pub use error::{Error, Result};
pub use models::{
    format_rupiah, AllTimeSummary, Amount, DailyLineItem, DailySummary, TransactionRecord,
    TransactionType, CATEGORIES, DEFAULT_PAYMENT_METHOD, INCOME_CATEGORY, PAYMENT_METHODS,
};
pub use pipeline::{Outcome, TransactionPipeline, UpstreamFailure};
pub use prompts::build_prompt;
pub use render::Reply;
pub use sheets::{AppsScriptStore, StoreError, TransactionStore};
pub use summary::{AllTimeSummaryOutcome, DailySummaryOutcome, SummaryQuery};
pub use telegram::{BotCommand, ChatEvent, ChatTransport, ParseMode, TelegramClient};
pub use validate::{validate, Validation, ValidationError};
