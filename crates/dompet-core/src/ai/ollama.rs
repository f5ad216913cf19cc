//! Ollama backend implementation
//!
//! Calls `POST {OLLAMA_URL}` with `{model, prompt, stream: false}` and reads the
//! `response` field. Every call is bounded by the configured completion timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{CompletionBackend, CompletionError};

/// Ollama HTTP backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// Create a backend for a full generate endpoint URL
    pub fn new(url: &str, model: &str, timeout: Duration) -> Self {
        Self::with_client(Client::new(), url, model, timeout)
    }

    /// Create a backend sharing an existing connection pool
    pub fn with_client(http_client: Client, url: &str, model: &str, timeout: Duration) -> Self {
        Self {
            http_client,
            url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    /// Server root, used for the tags (health) endpoint
    fn base_url(&self) -> &str {
        self.url
            .strip_suffix("/api/generate")
            .unwrap_or(&self.url)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Error connecting to Ollama API at {}: {}", self.url, e);
                CompletionError::from_reqwest(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Ollama API at {} returned HTTP {}", self.url, status);
            return Err(CompletionError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            error!("Failed to read Ollama response body: {}", e);
            CompletionError::from_reqwest(&e)
        })?;

        let parsed: OllamaResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Ollama response is not JSON: {}. Body: {}", e, body);
            CompletionError::Malformed(format!("body is not JSON: {}", e))
        })?;

        match parsed.response {
            Some(text) if !text.trim().is_empty() => {
                debug!("Ollama response: {}", text);
                Ok(text)
            }
            _ => {
                error!("Ollama response did not contain 'response' key. Body: {}", body);
                Err(CompletionError::Malformed(
                    "missing or empty 'response' field".into(),
                ))
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.url
    }
}
