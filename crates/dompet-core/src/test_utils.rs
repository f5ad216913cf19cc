//! Test utilities for dompet-core
//!
//! Mock HTTP servers standing in for the three collaborators: Ollama, the
//! Apps Script spreadsheet web app, and the Telegram Bot API. Each binds to an
//! ephemeral local port, answers according to a configured behavior, and
//! records what it received.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::telegram::{ChatTransport, ParseMode};

/// The expense example from the transaction prompt, as the model would echo it
pub const EXPENSE_EXAMPLE_REPLY: &str = r#"{
  "transaction_type": "expense",
  "amount": 25000,
  "description": "nasi goreng",
  "payment_method": "ShopeePay",
  "category": "Makanan"
}"#;

/// Handle for a spawned mock server; shuts down on drop
struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServerHandle {
    async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// ========== Ollama ==========

/// How the mock Ollama server answers `/api/generate`
#[derive(Debug, Clone)]
pub enum OllamaBehavior {
    /// 200 with `{"response": <text>}`
    Reply(String),
    /// Sleep this long, then reply with an empty object
    Delay(Duration),
    /// Respond with this status code
    Status(u16),
    /// 200 with this exact body
    RawBody(String),
}

/// A generate request as received by the mock
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Clone)]
struct OllamaState {
    behavior: OllamaBehavior,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

/// Mock Ollama server for testing
pub struct MockOllamaServer {
    handle: ServerHandle,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start(behavior: OllamaBehavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = OllamaState {
            behavior,
            requests: requests.clone(),
        };
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state);

        Self {
            handle: ServerHandle::spawn(app).await,
            requests,
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        self.handle.url()
    }

    /// Full generate endpoint (the value `OLLAMA_URL` would hold)
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.url())
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

async fn handle_tags() -> Json<Value> {
    Json(json!({ "models": [{ "name": "gemma3:latest", "size": 4_000_000_000u64 }] }))
}

async fn handle_generate(
    State(state): State<OllamaState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.requests.lock().unwrap().push(request.clone());

    match state.behavior {
        OllamaBehavior::Reply(text) => Json(json!({
            "model": request.model,
            "response": text,
            "done": true,
        }))
        .into_response(),
        OllamaBehavior::Delay(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({})).into_response()
        }
        OllamaBehavior::Status(code) => (status(code), "error").into_response(),
        OllamaBehavior::RawBody(body) => body.into_response(),
    }
}

// ========== Apps Script spreadsheet ==========

/// How the mock spreadsheet web app answers
#[derive(Debug, Clone)]
pub struct SheetBehavior {
    /// HTTP status for appends
    pub append_status: u16,
    /// Body for appends (defaults to a success message)
    pub append_body: Option<String>,
    /// Body for `action=get_daily`
    pub daily_body: Option<String>,
    /// Body for `action=calculate_expense_minus_income`
    pub summary_body: Option<String>,
    /// Sleep before answering anything
    pub delay: Option<Duration>,
}

impl Default for SheetBehavior {
    fn default() -> Self {
        Self {
            append_status: 200,
            append_body: None,
            daily_body: None,
            summary_body: None,
            delay: None,
        }
    }
}

#[derive(Clone)]
struct SheetState {
    behavior: SheetBehavior,
    appends: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// Mock Apps Script web app
pub struct MockSheetServer {
    handle: ServerHandle,
    appends: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockSheetServer {
    pub async fn start(behavior: SheetBehavior) -> Self {
        let appends = Arc::new(Mutex::new(Vec::new()));
        let queries = Arc::new(Mutex::new(Vec::new()));
        let state = SheetState {
            behavior,
            appends: appends.clone(),
            queries: queries.clone(),
        };
        let app = Router::new()
            .route("/exec", get(handle_sheet_get).post(handle_sheet_post))
            .with_state(state);

        Self {
            handle: ServerHandle::spawn(app).await,
            appends,
            queries,
        }
    }

    /// Web app URL (the value `APP_SCRIPT_URL` would hold)
    pub fn url(&self) -> String {
        format!("{}/exec", self.handle.url())
    }

    pub fn append_count(&self) -> usize {
        self.appends.lock().unwrap().len()
    }

    pub fn last_append(&self) -> Option<Value> {
        self.appends.lock().unwrap().last().cloned()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.queries.lock().unwrap().last().cloned()
    }
}

async fn handle_sheet_post(State(state): State<SheetState>, body: String) -> Response {
    let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
    state.appends.lock().unwrap().push(value);

    if let Some(delay) = state.behavior.delay {
        tokio::time::sleep(delay).await;
    }

    let body = state.behavior.append_body.clone().unwrap_or_else(|| {
        r#"{"status":"success","message":"Data berhasil ditambahkan"}"#.to_string()
    });
    (status(state.behavior.append_status), body).into_response()
}

async fn handle_sheet_get(
    State(state): State<SheetState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.queries.lock().unwrap().push(params.clone());

    if let Some(delay) = state.behavior.delay {
        tokio::time::sleep(delay).await;
    }

    let body = match params.get("action").map(String::as_str) {
        Some("get_daily") => state.behavior.daily_body.clone().unwrap_or_else(|| {
            json!({
                "status": "success",
                "date": params.get("date"),
                "expenses": [],
                "total": 0
            })
            .to_string()
        }),
        Some("calculate_expense_minus_income") => {
            state.behavior.summary_body.clone().unwrap_or_else(|| {
                json!({
                    "status": "success",
                    "calculationPeriod": "all_time",
                    "totalExpense": 1_250_000,
                    "totalIncome": 5_000_000,
                    "expenseMinusIncome": -3_750_000
                })
                .to_string()
            })
        }
        _ => json!({
            "status": "error",
            "message": "Aksi tidak valid atau tanggal tidak disediakan."
        })
        .to_string(),
    };

    body.into_response()
}

// ========== Telegram ==========

#[derive(Clone)]
struct TelegramState {
    updates: Arc<Mutex<Vec<Value>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

/// Mock Telegram Bot API
///
/// `getUpdates` hands out queued updates once; every call is recorded.
pub struct MockTelegramServer {
    handle: ServerHandle,
    updates: Arc<Mutex<Vec<Value>>>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockTelegramServer {
    pub async fn start() -> Self {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = TelegramState {
            updates: updates.clone(),
            calls: calls.clone(),
        };
        let app = Router::new()
            .route("/:bot/:method", post(handle_telegram))
            .with_state(state);

        Self {
            handle: ServerHandle::spawn(app).await,
            updates,
            calls,
        }
    }

    /// API base URL (replaces `https://api.telegram.org`)
    pub fn url(&self) -> String {
        self.handle.url()
    }

    /// Queue an update for the next `getUpdates`
    pub fn push_update(&self, update: Value) {
        self.updates.lock().unwrap().push(update);
    }

    /// Bodies of every call to `method`
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn handle_telegram(
    State(state): State<TelegramState>,
    Path((_bot, method)): Path<(String, String)>,
    body: String,
) -> Json<Value> {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.calls.lock().unwrap().push((method.clone(), body));

    let result = match method.as_str() {
        "getUpdates" => {
            let updates = std::mem::take(&mut *state.updates.lock().unwrap());
            if updates.is_empty() {
                // Stand-in for long polling so pollers don't spin
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Value::Array(updates)
        }
        "getMe" => json!({ "id": 1, "is_bot": true, "first_name": "Dompet", "username": "dompet_bot" }),
        "sendMessage" => json!({ "message_id": 1, "date": 0, "chat": { "id": 1 } }),
        _ => Value::Bool(true),
    };
    Json(json!({ "ok": true, "result": result }))
}

// ========== In-memory chat transport ==========

/// A reply captured by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

/// Chat transport that records replies instead of sending them
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    actions: Arc<Mutex<Vec<i64>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn typing_count(&self) -> usize {
        self.actions.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> crate::Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            parse_mode,
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> crate::Result<()> {
        self.actions.lock().unwrap().push(chat_id);
        Ok(())
    }
}
