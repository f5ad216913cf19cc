//! Mock backend for testing
//!
//! Returns a fixed reply or a fixed failure and counts calls, so tests can
//! assert that a request never reached the model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{CompletionBackend, CompletionError};

/// Mock completion backend
#[derive(Clone)]
pub struct MockBackend {
    reply: Result<String, CompletionError>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Backend that always answers with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Backend that always fails with `error`
    pub fn failing(error: CompletionError) -> Self {
        Self {
            reply: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    async fn health_check(&self) -> bool {
        self.reply.is_ok()
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
