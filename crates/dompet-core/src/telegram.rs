//! Telegram Bot API transport
//!
//! A small reqwest client for the handful of Bot API methods the bot uses,
//! plus classification of raw updates into [`ChatEvent`]s.
//!
//! The bot token is part of every request URL, so transport errors are
//! stripped of their URL before they are logged or returned.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Extra time allowed on top of the long-poll timeout before the HTTP call gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Timeout for ordinary (non-polling) calls
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Message formatting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

/// Commands the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// `/harian`
    DailySummary,
    /// `/sisa_cash`
    AllTimeSummary,
    /// `/start` or `/help`
    Help,
}

impl BotCommand {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "harian" => Some(Self::DailySummary),
            "sisa_cash" => Some(Self::AllTimeSummary),
            "start" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// An inbound event the bot acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Text {
        text: String,
        sender_id: i64,
        chat_id: i64,
    },
    Command {
        command: BotCommand,
        chat_id: i64,
    },
}

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s|$)").expect("valid regex")
    })
}

impl ChatEvent {
    /// Classify an update
    ///
    /// Returns None for anything the bot ignores: non-message updates,
    /// messages without text, unknown commands, and text without a sender.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        let chat_id = message.chat.id;

        if text.starts_with('/') {
            let name = command_regex().captures(text)?.get(1)?.as_str();
            let command = BotCommand::from_name(name);
            if command.is_none() {
                debug!("Ignoring unknown command /{}", name);
            }
            return command.map(|command| ChatEvent::Command { command, chat_id });
        }

        let sender_id = message.from.as_ref()?.id;
        Some(ChatEvent::Text {
            text: text.to_string(),
            sender_id,
            chat_id,
        })
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Text { chat_id, .. } | Self::Command { chat_id, .. } => *chat_id,
        }
    }
}

/// Outbound side of the chat
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()>;

    /// Show a "typing" indicator
    async fn send_typing(&self, chat_id: i64) -> Result<()>;
}

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http_client: Client,
    token: String,
    api_base: String,
}

impl TelegramClient {
    pub fn new(token: &str, http_client: Client) -> Self {
        Self {
            http_client,
            token: token.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point at a different API server (local Bot API server, tests)
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn call<P: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
        timeout: Duration,
    ) -> Result<R> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self
            .http_client
            .post(url)
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let body: ApiResponse<R> = response
            .json()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        if !body.ok {
            return Err(Error::Telegram(format!(
                "{} failed ({}): {}",
                method,
                body.error_code.unwrap_or_default(),
                body.description.unwrap_or_else(|| "no description".into())
            )));
        }

        body.result
            .ok_or_else(|| Error::Telegram(format!("{} returned no result", method)))
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>> {
        let params = json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &params, timeout + POLL_GRACE).await
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({}), CALL_TIMEOUT).await
    }

    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<()> {
        let params = json!({ "chat_id": chat_id, "action": action });
        let _: bool = self.call("sendChatAction", &params, CALL_TIMEOUT).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        let mut params = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            params["parse_mode"] = serde_json::to_value(mode)?;
        }
        let _: serde_json::Value = self.call("sendMessage", &params, CALL_TIMEOUT).await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.send_chat_action(chat_id, "typing").await
    }
}
