//! Bot dispatcher
//!
//! Routes chat events to the pipeline or the summaries and sends back exactly
//! one reply per event. [`Bot::run`] long-polls Telegram and handles each event
//! on its own task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::pipeline::TransactionPipeline;
use crate::render::{self, Reply};
use crate::summary::SummaryQuery;
use crate::telegram::{BotCommand, ChatEvent, ChatTransport, TelegramClient};

/// Pause after a failed poll before trying again
const POLL_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Bot {
    pipeline: TransactionPipeline,
    summaries: SummaryQuery,
    transport: Arc<dyn ChatTransport>,
}

impl Bot {
    pub fn new(
        pipeline: TransactionPipeline,
        summaries: SummaryQuery,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            pipeline,
            summaries,
            transport,
        }
    }

    /// Compute the reply for an event without sending it
    pub async fn respond(&self, event: &ChatEvent) -> Reply {
        match event {
            ChatEvent::Text {
                text,
                sender_id,
                chat_id,
            } => {
                info!("Received message from chat_id {}: {}", chat_id, text);
                let outcome = self.pipeline.process(text, *sender_id).await;
                debug!(outcome = outcome.label(), "Pipeline finished");
                render::outcome(&outcome)
            }
            ChatEvent::Command { command, chat_id } => {
                info!("Received {:?} command from chat_id {}", command, chat_id);
                match command {
                    BotCommand::DailySummary => {
                        let today = Local::now().date_naive();
                        render::daily(&self.summaries.daily(today).await)
                    }
                    BotCommand::AllTimeSummary => {
                        render::all_time(&self.summaries.all_time().await)
                    }
                    BotCommand::Help => Reply::plain(render::HELP),
                }
            }
        }
    }

    /// Handle one event end to end
    ///
    /// The work runs on its own task so a panic anywhere in it still produces
    /// the internal-error reply.
    pub async fn handle_event(&self, event: ChatEvent) {
        let chat_id = event.chat_id();

        let authorized = match &event {
            ChatEvent::Text { sender_id, .. } => self.pipeline.is_authorized(*sender_id),
            ChatEvent::Command { .. } => true,
        };
        if authorized {
            if let Err(e) = self.transport.send_typing(chat_id).await {
                debug!("Failed to send typing action: {}", e);
            }
        }

        let worker = self.clone();
        let reply = match tokio::spawn(async move { worker.respond(&event).await }).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Handler for chat_id {} failed: {}", chat_id, e);
                Reply::plain(render::INTERNAL_ERROR)
            }
        };

        if let Err(e) = self
            .transport
            .send_message(chat_id, &reply.text, reply.parse_mode)
            .await
        {
            error!("Failed to send reply to chat_id {}: {}", chat_id, e);
        }
    }

    /// Poll for updates forever, handling each event concurrently
    pub async fn run(&self, client: &TelegramClient, poll_timeout: Duration) {
        let mut offset = 0;
        info!("Bot is polling for updates");

        loop {
            let updates = match client.get_updates(offset, poll_timeout).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("Failed to fetch updates: {}. Retrying in {:?}", e, POLL_BACKOFF);
                    tokio::time::sleep(POLL_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(event) = ChatEvent::from_update(&update) else {
                    continue;
                };
                let bot = self.clone();
                tokio::spawn(async move { bot.handle_event(event).await });
            }
        }
    }
}
