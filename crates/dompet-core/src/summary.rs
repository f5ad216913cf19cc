//! Read-side summaries
//!
//! Both summaries are fetched fresh from the spreadsheet on every request.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::models::{AllTimeSummary, DailySummary};
use crate::sheets::{StoreError, TransactionStore};

/// Result of a daily summary request
#[derive(Debug, Clone, PartialEq)]
pub enum DailySummaryOutcome {
    Report(DailySummary),
    /// Nothing recorded on this date
    Empty { date: NaiveDate },
    Failed(StoreError),
}

/// Result of an all-time summary request
#[derive(Debug, Clone, PartialEq)]
pub enum AllTimeSummaryOutcome {
    Report(AllTimeSummary),
    Failed(StoreError),
}

/// Runs summary queries against a store
#[derive(Clone)]
pub struct SummaryQuery {
    store: Arc<dyn TransactionStore>,
}

impl SummaryQuery {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    pub async fn daily(&self, date: NaiveDate) -> DailySummaryOutcome {
        match self.store.daily(date).await {
            Ok(summary) if summary.items.is_empty() => {
                info!("No transactions recorded for {}", date);
                DailySummaryOutcome::Empty { date }
            }
            Ok(summary) => DailySummaryOutcome::Report(summary),
            Err(e) => DailySummaryOutcome::Failed(e),
        }
    }

    pub async fn all_time(&self) -> AllTimeSummaryOutcome {
        match self.store.all_time().await {
            Ok(summary) => AllTimeSummaryOutcome::Report(summary),
            Err(e) => AllTimeSummaryOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::AppsScriptStore;
    use crate::test_utils::{MockSheetServer, SheetBehavior};
    use std::time::Duration;

    fn query(server: &MockSheetServer) -> SummaryQuery {
        let timeout = Duration::from_secs(5);
        SummaryQuery::new(Arc::new(AppsScriptStore::new(&server.url(), timeout, timeout)))
    }

    fn may_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_daily_empty() {
        let server = MockSheetServer::start(SheetBehavior::default()).await;
        assert_eq!(
            query(&server).daily(may_day()).await,
            DailySummaryOutcome::Empty { date: may_day() }
        );
    }

    #[tokio::test]
    async fn test_daily_report_keeps_order() {
        let server = MockSheetServer::start(SheetBehavior {
            daily_body: Some(
                r#"{"status":"success","expenses":[
                    {"description":"kopi","amount":18000,"category":"Makanan","payment_method":"Gopay","type":"expense"},
                    {"description":"ojek","amount":12000,"category":"Transportasi","payment_method":"Cash","type":"expense"}
                ],"total":30000}"#
                    .into(),
            ),
            ..Default::default()
        })
        .await;

        let DailySummaryOutcome::Report(summary) = query(&server).daily(may_day()).await else {
            panic!("expected report");
        };
        let descriptions: Vec<_> = summary.items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, ["kopi", "ojek"]);
        assert_eq!(summary.total, 30000.0);
    }

    #[tokio::test]
    async fn test_daily_failure() {
        let server = MockSheetServer::start(SheetBehavior {
            daily_body: Some(r#"{"status":"error","message":"Sheet tidak ditemukan"}"#.into()),
            ..Default::default()
        })
        .await;

        assert_eq!(
            query(&server).daily(may_day()).await,
            DailySummaryOutcome::Failed(StoreError::Rejected(Some(
                "Sheet tidak ditemukan".into()
            )))
        );
    }

    #[tokio::test]
    async fn test_all_time() {
        let server = MockSheetServer::start(SheetBehavior::default()).await;
        let AllTimeSummaryOutcome::Report(summary) = query(&server).all_time().await else {
            panic!("expected report");
        };
        assert_eq!(summary.total_income, 5_000_000.0);
    }

    #[tokio::test]
    async fn test_all_time_rejected_without_message() {
        let server = MockSheetServer::start(SheetBehavior {
            summary_body: Some(r#"{"status":"error"}"#.into()),
            ..Default::default()
        })
        .await;

        assert_eq!(
            query(&server).all_time().await,
            AllTimeSummaryOutcome::Failed(StoreError::Rejected(None))
        );
    }
}
