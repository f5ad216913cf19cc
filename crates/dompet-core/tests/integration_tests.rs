//! Integration tests for dompet-core
//!
//! These tests exercise the full message → pipeline → store → summary workflow
//! through the public API, with an in-memory store standing in for the
//! spreadsheet.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use dompet_core::{
    render, AllTimeSummary, AllTimeSummaryOutcome, CompletionError, DailyLineItem, DailySummary,
    DailySummaryOutcome, MockBackend, Outcome, StoreError, SummaryQuery, TransactionPipeline,
    TransactionRecord, TransactionStore, TransactionType, UpstreamFailure, ValidationError,
};

const USER: i64 = 4242;

/// Keeps appended rows in memory and computes summaries from them
#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<TransactionRecord>>,
    fail_appends: bool,
}

impl MemoryStore {
    fn failing() -> Self {
        Self {
            fail_appends: true,
            ..Default::default()
        }
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn append(&self, record: &TransactionRecord) -> Result<(), StoreError> {
        if self.fail_appends {
            return Err(StoreError::Status(500));
        }
        self.rows.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn daily(&self, date: NaiveDate) -> Result<DailySummary, StoreError> {
        let rows = self.rows.lock().unwrap();
        let items: Vec<DailyLineItem> = rows
            .iter()
            .map(|r| DailyLineItem {
                description: r.description.clone(),
                amount: r.amount.as_f64(),
                category: r.category_label().to_string(),
                payment_method: r.payment_method.clone().unwrap_or_default(),
                transaction_type: r.transaction_type.to_string(),
            })
            .collect();
        let total = rows
            .iter()
            .filter(|r| r.transaction_type == TransactionType::Expense)
            .map(|r| r.amount.as_f64())
            .sum();
        Ok(DailySummary { date, items, total })
    }

    async fn all_time(&self) -> Result<AllTimeSummary, StoreError> {
        let rows = self.rows.lock().unwrap();
        let sum = |kind: TransactionType| -> f64 {
            rows.iter()
                .filter(|r| r.transaction_type == kind)
                .map(|r| r.amount.as_f64())
                .sum()
        };
        let total_income = sum(TransactionType::Income);
        let total_expense = sum(TransactionType::Expense);
        Ok(AllTimeSummary {
            total_income,
            total_expense,
            expense_minus_income: total_expense - total_income,
        })
    }
}

fn pipeline(reply: &str, store: Arc<MemoryStore>) -> TransactionPipeline {
    TransactionPipeline::new(Arc::new(MockBackend::replying(reply)), store, USER)
}

// =============================================================================
// Pipeline Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_expense_then_income_then_summaries() {
    let store = Arc::new(MemoryStore::default());

    let expense = pipeline(
        r#"Tentu! {"transaction_type":"expense","amount":25000,"description":"nasi goreng","payment_method":"ShopeePay","category":"Makanan"} Semoga membantu."#,
        store.clone(),
    )
    .process("25K nasi goreng via ShopeePay", USER)
    .await;
    assert!(matches!(expense, Outcome::PersistedOk(_)));

    let income = pipeline(
        r#"{"transaction_type":"income","amount":500000,"description":"Ambil uang dari atm","payment_method":"Cash","category":"Pemasukan"}"#,
        store.clone(),
    )
    .process("Ambil uang dari atm 500000", USER)
    .await;
    assert!(matches!(income, Outcome::PersistedOk(_)));
    assert_eq!(store.len(), 2);

    let summaries = SummaryQuery::new(store.clone());
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let DailySummaryOutcome::Report(daily) = summaries.daily(date).await else {
        panic!("expected daily report");
    };
    assert_eq!(daily.items.len(), 2);
    assert_eq!(daily.total, 25000.0);
    let text = render::daily(&DailySummaryOutcome::Report(daily)).text;
    assert!(text.contains("1. nasi goreng (Makanan/ShopeePay) - Rp25,000"));
    assert!(text.contains("*Total Hari Ini: Rp25,000*"));

    let all_time = summaries.all_time().await;
    let AllTimeSummaryOutcome::Report(totals) = &all_time else {
        panic!("expected all-time report");
    };
    assert_eq!(totals.expense_minus_income, -475000.0);
    assert!(render::all_time(&all_time)
        .text
        .ends_with("🏦 Sisa Cash: Rp475,000"));
}

#[tokio::test]
async fn test_failures_never_reach_the_store() {
    let store = Arc::new(MemoryStore::default());

    let cases = [
        ("Maaf, saya tidak paham.", Outcome::ExtractionFailed),
        ("{amount: 25000}", Outcome::ExtractionFailed),
        (
            r#"{"description":"nasi goreng"}"#,
            Outcome::ValidationFailed(ValidationError::MissingAmount),
        ),
        (
            r#"{"amount":0}"#,
            Outcome::ValidationFailed(ValidationError::NonPositiveAmount(0.into())),
        ),
    ];

    for (reply, expected) in cases {
        let outcome = pipeline(reply, store.clone()).process("x", USER).await;
        assert_eq!(outcome, expected, "reply: {}", reply);
    }

    let unreachable = TransactionPipeline::new(
        Arc::new(MockBackend::failing(CompletionError::Timeout)),
        store.clone(),
        USER,
    );
    assert_eq!(
        unreachable.process("x", USER).await,
        Outcome::UpstreamUnavailable(UpstreamFailure::Timeout)
    );

    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_store_failure_is_reported_distinctly() {
    let store = Arc::new(MemoryStore::failing());
    let outcome = pipeline(r#"{"amount":25000,"description":"kopi"}"#, store)
        .process("25K kopi", USER)
        .await;

    let Outcome::PersistedFailed(record) = &outcome else {
        panic!("expected PersistedFailed, got {:?}", outcome);
    };
    assert_eq!(record.description, "kopi");
    assert!(render::outcome(&outcome).text.contains("TAPI GAGAL"));
}

#[tokio::test]
async fn test_empty_day() {
    let summaries = SummaryQuery::new(Arc::new(MemoryStore::default()));
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    assert_eq!(
        summaries.daily(date).await,
        DailySummaryOutcome::Empty { date }
    );
}
