//! Transaction pipeline
//!
//! One utterance in, one [`Outcome`] out:
//!
//! authorize → build prompt → complete → extract → validate → persist
//!
//! Every stage failure is terminal and maps to exactly one outcome variant.
//! Nothing is retried and nothing escapes as an error; the caller only has to
//! render the outcome.

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::ai::{extract_fields, CompletionBackend, CompletionError, OllamaBackend};
use crate::config::Config;
use crate::models::TransactionRecord;
use crate::prompts::build_prompt;
use crate::sheets::{AppsScriptStore, TransactionStore};
use crate::validate::{validate, Validation, ValidationError};

/// How the completion service failed to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    Timeout,
    Connection,
    Status(u16),
}

/// Terminal result of processing one utterance
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Sender is not the configured user; nothing else happened
    Unauthorized,
    UpstreamUnavailable(UpstreamFailure),
    /// Completion succeeded but carried no usable text
    UpstreamMalformed,
    /// No decodable JSON object in the completion text
    ExtractionFailed,
    ValidationFailed(ValidationError),
    PersistedOk(TransactionRecord),
    /// Parsed and validated, but the spreadsheet did not accept it
    PersistedFailed(TransactionRecord),
    InternalError,
}

impl Outcome {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamMalformed => "upstream_malformed",
            Self::ExtractionFailed => "extraction_failed",
            Self::ValidationFailed(_) => "validation_failed",
            Self::PersistedOk(_) => "persisted_ok",
            Self::PersistedFailed(_) => "persisted_failed",
            Self::InternalError => "internal_error",
        }
    }
}

impl From<CompletionError> for Outcome {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::Timeout => Self::UpstreamUnavailable(UpstreamFailure::Timeout),
            CompletionError::Connection(_) => {
                Self::UpstreamUnavailable(UpstreamFailure::Connection)
            }
            CompletionError::Status(code) => {
                Self::UpstreamUnavailable(UpstreamFailure::Status(code))
            }
            CompletionError::Malformed(_) => Self::UpstreamMalformed,
            CompletionError::Internal(_) => Self::InternalError,
        }
    }
}

/// Parses utterances into records and persists them
#[derive(Clone)]
pub struct TransactionPipeline {
    backend: Arc<dyn CompletionBackend>,
    store: Arc<dyn TransactionStore>,
    authorized_user_id: i64,
}

impl TransactionPipeline {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        store: Arc<dyn TransactionStore>,
        authorized_user_id: i64,
    ) -> Self {
        Self {
            backend,
            store,
            authorized_user_id,
        }
    }

    /// Wire up the Ollama backend and the Apps Script store from config,
    /// sharing one connection pool
    pub fn from_config(config: &Config, http_client: Client) -> Self {
        let backend = OllamaBackend::with_client(
            http_client.clone(),
            &config.ollama_url,
            &config.ollama_model,
            config.timeouts.completion,
        );
        let store = AppsScriptStore::with_client(
            http_client,
            &config.app_script_url,
            config.timeouts.persist,
            config.timeouts.query,
        );
        Self::new(
            Arc::new(backend),
            Arc::new(store),
            config.authorized_user_id,
        )
    }

    pub fn is_authorized(&self, user_id: i64) -> bool {
        user_id == self.authorized_user_id
    }

    pub fn backend(&self) -> &Arc<dyn CompletionBackend> {
        &self.backend
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    /// Run the full pipeline for a message from `user_id`
    pub async fn process(&self, utterance: &str, user_id: i64) -> Outcome {
        if !self.is_authorized(user_id) {
            warn!(user_id = user_id, "Unauthorized user attempted to log a transaction");
            return Outcome::Unauthorized;
        }

        let record = match self.interpret(utterance).await {
            Ok(record) => record,
            Err(outcome) => return outcome,
        };

        match self.store.append(&record).await {
            Ok(()) => {
                info!(
                    "Recorded {} {} ({})",
                    record.transaction_type,
                    record.amount,
                    record.category_label()
                );
                Outcome::PersistedOk(record)
            }
            Err(e) => {
                error!("Failed to persist transaction: {}", e);
                Outcome::PersistedFailed(record)
            }
        }
    }

    /// Parse and validate without persisting
    ///
    /// `Err` carries the terminal outcome of whichever stage failed.
    pub async fn interpret(&self, utterance: &str) -> Result<TransactionRecord, Outcome> {
        let prompt = build_prompt(utterance);

        let text = self.backend.complete(&prompt).await.map_err(|e| {
            warn!(
                "Completion via {} ({}) failed: {}",
                self.backend.host(),
                self.backend.model(),
                e
            );
            Outcome::from(e)
        })?;
        debug!("Raw completion text: {}", text);

        let fields = extract_fields(&text).map_err(|_| Outcome::ExtractionFailed)?;

        match validate(&fields) {
            Validation::Admissible(record) => Ok(record),
            Validation::Rejected(reason) => Err(Outcome::ValidationFailed(reason)),
        }
    }
}
