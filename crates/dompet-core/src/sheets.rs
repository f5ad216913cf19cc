//! Spreadsheet persistence via a Google Apps Script webhook
//!
//! The spreadsheet is the system of record. This module only talks to the web
//! app deployed in front of it:
//!
//! - `POST {url}` with the record as JSON appends a row
//! - `GET {url}?action=get_daily&date=YYYY-MM-DD` lists one day's rows
//! - `GET {url}?action=calculate_expense_minus_income` returns all-time totals
//!
//! Read responses carry `status: "success"` or `status: "error"` plus `message`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{AllTimeSummary, DailyLineItem, DailySummary, TransactionRecord};

/// Why a spreadsheet call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Spreadsheet request timed out")]
    Timeout,

    #[error("Spreadsheet unreachable: {0}")]
    Transport(String),

    #[error("Spreadsheet returned HTTP {0}")]
    Status(u16),

    /// The service answered `status != "success"`
    #[error("Spreadsheet reported an error: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),

    /// Body was not JSON
    #[error("Spreadsheet response is not JSON: {0}")]
    Decode(String),

    /// JSON, but not the expected shape
    #[error("Unexpected spreadsheet response: {0}")]
    Shape(String),
}

impl StoreError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Append/query access to the transaction log
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Append one validated record
    async fn append(&self, record: &TransactionRecord) -> Result<(), StoreError>;

    /// All rows recorded on `date`
    async fn daily(&self, date: NaiveDate) -> Result<DailySummary, StoreError>;

    /// All-time income and expense totals
    async fn all_time(&self) -> Result<AllTimeSummary, StoreError>;
}

/// Apps Script web app client
#[derive(Clone)]
pub struct AppsScriptStore {
    http_client: Client,
    url: String,
    persist_timeout: Duration,
    query_timeout: Duration,
}

impl AppsScriptStore {
    pub fn new(url: &str, persist_timeout: Duration, query_timeout: Duration) -> Self {
        Self::with_client(Client::new(), url, persist_timeout, query_timeout)
    }

    /// Create a store sharing an existing connection pool
    pub fn with_client(
        http_client: Client,
        url: &str,
        persist_timeout: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            url: url.to_string(),
            persist_timeout,
            query_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET with query parameters, returning the JSON body once `status` is "success"
    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, StoreError> {
        let response = self
            .http_client
            .get(&self.url)
            .query(params)
            .timeout(self.query_timeout)
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching spreadsheet summary {:?}: {}", params, e);
                StoreError::from_reqwest(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Spreadsheet query {:?} returned HTTP {}", params, status);
            return Err(StoreError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            error!("Failed to read spreadsheet response: {}", e);
            StoreError::from_reqwest(&e)
        })?;

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            error!("Error parsing spreadsheet response: {}. Body: {}", e, body);
            StoreError::Decode(e.to_string())
        })?;

        if json.get("status").and_then(Value::as_str) != Some("success") {
            let message = json
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            warn!(
                "Spreadsheet query {:?} failed: {}",
                params,
                message.as_deref().unwrap_or("no message")
            );
            return Err(StoreError::Rejected(message));
        }

        Ok(json)
    }
}

/// Daily query response (`status` already checked)
#[derive(Debug, Deserialize)]
struct DailyResponse {
    expenses: Vec<DailyLineItem>,
    #[serde(default)]
    total: f64,
}

#[async_trait]
impl TransactionStore for AppsScriptStore {
    async fn append(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        let response = self
            .http_client
            .post(&self.url)
            .timeout(self.persist_timeout)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send data to spreadsheet: {}", e);
                StoreError::from_reqwest(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Failed to send data to spreadsheet: HTTP {}", status);
            return Err(StoreError::Status(status.as_u16()));
        }

        // The web app reports script failures in a 200 body.
        let body = response.text().await.unwrap_or_default();
        if let Ok(json) = serde_json::from_str::<Value>(&body) {
            if json.get("status").and_then(Value::as_str) == Some("error") {
                let message = json
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                error!("Spreadsheet rejected the row: {:?}", message);
                return Err(StoreError::Rejected(message));
            }
        }

        info!("Data successfully sent to spreadsheet");
        Ok(())
    }

    async fn daily(&self, date: NaiveDate) -> Result<DailySummary, StoreError> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let json = self
            .query(&[("action", "get_daily"), ("date", date_str.as_str())])
            .await?;

        let parsed: DailyResponse = serde_json::from_value(json).map_err(|e| {
            error!("Unexpected daily summary shape: {}", e);
            StoreError::Shape(e.to_string())
        })?;

        Ok(DailySummary {
            date,
            items: parsed.expenses,
            total: parsed.total,
        })
    }

    async fn all_time(&self) -> Result<AllTimeSummary, StoreError> {
        let json = self
            .query(&[("action", "calculate_expense_minus_income")])
            .await?;

        serde_json::from_value(json).map_err(|e| {
            error!("Unexpected all-time summary shape: {}", e);
            StoreError::Shape(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Amount, TransactionType};
    use crate::test_utils::{MockSheetServer, SheetBehavior};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn store(server: &MockSheetServer) -> AppsScriptStore {
        AppsScriptStore::new(&server.url(), TIMEOUT, TIMEOUT)
    }

    fn record() -> TransactionRecord {
        TransactionRecord {
            transaction_type: TransactionType::Expense,
            amount: Amount::from(25000),
            description: "nasi goreng".into(),
            payment_method: Some("ShopeePay".into()),
            category: Some("Makanan".into()),
        }
    }

    #[tokio::test]
    async fn test_append_posts_record() {
        let server = MockSheetServer::start(SheetBehavior::default()).await;
        store(&server).append(&record()).await.unwrap();

        assert_eq!(server.append_count(), 1);
        let body = server.last_append().unwrap();
        assert_eq!(body["amount"], 25000);
        assert_eq!(body["payment_method"], "ShopeePay");
        assert_eq!(body["transaction_type"], "expense");
    }

    #[tokio::test]
    async fn test_append_server_error() {
        let server = MockSheetServer::start(SheetBehavior {
            append_status: 500,
            ..Default::default()
        })
        .await;

        assert_eq!(
            store(&server).append(&record()).await,
            Err(StoreError::Status(500))
        );
    }

    #[tokio::test]
    async fn test_append_error_in_body() {
        let server = MockSheetServer::start(SheetBehavior {
            append_body: Some(r#"{"status":"error","message":"Gagal menyimpan data"}"#.into()),
            ..Default::default()
        })
        .await;

        assert_eq!(
            store(&server).append(&record()).await,
            Err(StoreError::Rejected(Some("Gagal menyimpan data".into())))
        );
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let server = MockSheetServer::start(SheetBehavior {
            daily_body: Some(
                r#"{"status":"success","date":"2024-05-01","expenses":[
                    {"description":"nasi goreng","amount":25000,"category":"Makanan","payment_method":"ShopeePay","type":"expense"},
                    {"description":"gaji","amount":5000000,"category":"Pemasukan","payment_method":"BCA","type":"income"}
                ],"total":25000}"#
                    .into(),
            ),
            ..Default::default()
        })
        .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = store(&server).daily(date).await.unwrap();
        assert_eq!(summary.date, date);
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.items[0].description, "nasi goreng");
        assert_eq!(summary.items[1].transaction_type, "income");
        assert_eq!(summary.total, 25000.0);

        let query = server.last_query().unwrap();
        assert_eq!(query.get("action").map(String::as_str), Some("get_daily"));
        assert_eq!(query.get("date").map(String::as_str), Some("2024-05-01"));
    }

    #[tokio::test]
    async fn test_daily_summary_with_numeric_description() {
        let server = MockSheetServer::start(SheetBehavior {
            daily_body: Some(
                r#"{"status":"success","date":"2024-05-01","expenses":[
                    {"description":"kopi","amount":18000,"category":"Makanan","payment_method":"Cash","type":"expense"},
                    {"description":2024,"amount":50000,"category":"Hiburan","payment_method":"Gopay","type":"expense"}
                ],"total":68000}"#
                    .into(),
            ),
            ..Default::default()
        })
        .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = store(&server).daily(date).await.unwrap();
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.items[0].description, "kopi");
        assert_eq!(summary.items[1].description, "2024");
        assert_eq!(summary.total, 68000.0);
    }

    #[tokio::test]
    async fn test_daily_error_status_carries_message() {
        let server = MockSheetServer::start(SheetBehavior {
            daily_body: Some(r#"{"status":"error","message":"Kolom tidak ditemukan"}"#.into()),
            ..Default::default()
        })
        .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            store(&server).daily(date).await,
            Err(StoreError::Rejected(Some("Kolom tidak ditemukan".into())))
        );
    }

    #[tokio::test]
    async fn test_daily_missing_expenses_is_shape_error() {
        let server = MockSheetServer::start(SheetBehavior {
            daily_body: Some(r#"{"status":"success"}"#.into()),
            ..Default::default()
        })
        .await;

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(matches!(
            store(&server).daily(date).await,
            Err(StoreError::Shape(_))
        ));
    }

    #[tokio::test]
    async fn test_query_non_json_body() {
        let server = MockSheetServer::start(SheetBehavior {
            summary_body: Some("<html>Sign in</html>".into()),
            ..Default::default()
        })
        .await;

        assert!(matches!(
            store(&server).all_time().await,
            Err(StoreError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let server = MockSheetServer::start(SheetBehavior {
            delay: Some(Duration::from_secs(3)),
            ..Default::default()
        })
        .await;
        let store = AppsScriptStore::new(&server.url(), TIMEOUT, Duration::from_millis(200));

        assert_eq!(store.all_time().await, Err(StoreError::Timeout));
    }

    #[tokio::test]
    async fn test_all_time_summary() {
        let server = MockSheetServer::start(SheetBehavior::default()).await;
        let summary = store(&server).all_time().await.unwrap();

        assert_eq!(summary.total_income, 5_000_000.0);
        assert_eq!(summary.total_expense, 1_250_000.0);
        assert_eq!(summary.expense_minus_income, -3_750_000.0);

        let query = server.last_query().unwrap();
        assert_eq!(
            query.get("action").map(String::as_str),
            Some("calculate_expense_minus_income")
        );
    }
}
