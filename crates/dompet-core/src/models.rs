//! Domain models for Dompet

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Payment methods the completion service is asked to choose from
pub const PAYMENT_METHODS: &[&str] = &["BCA", "Jago", "ShopeePay", "Gopay", "Cash"];

/// Categories the completion service is asked to choose from
pub const CATEGORIES: &[&str] = &[
    "Makanan",
    "Bahan Makanan",
    "Transportasi",
    "Belanja Harian",
    "Belanja Online",
    "Tagihan",
    "Hiburan",
    "Buah",
    "Kesehatan",
    "Pemasukan",
];

/// Payment method used when the utterance does not mention one
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash";

/// Category reserved for income transactions
pub const INCOME_CATEGORY: &str = "Pemasukan";

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Interpret a label from the completion service
    ///
    /// Anything other than "income" (case-insensitive) is an expense.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("income") {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction amount in whole Rupiah
///
/// Keeps the JSON number exactly as the completion service produced it, so the
/// value written to the spreadsheet is the value that was validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(serde_json::Number);

impl Amount {
    /// Wrap a JSON number, returning None unless it is strictly positive
    pub fn positive(number: serde_json::Number) -> Option<Self> {
        match number.as_f64() {
            Some(value) if value.is_finite() && value > 0.0 => Some(Self(number)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }

    pub fn as_number(&self) -> &serde_json::Number {
        &self.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(serde_json::Number::from(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(whole) = self.0.as_u64() {
            write!(f, "{}", group_digits(&whole.to_string()))
        } else {
            write!(f, "{}", group_thousands(self.as_f64()))
        }
    }
}

/// One parsed and validated transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_type: TransactionType,
    pub amount: Amount,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TransactionRecord {
    /// Category for display ("N/A" when the parse left it out)
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("N/A")
    }

    /// Description for display ("N/A" when empty)
    pub fn description_label(&self) -> &str {
        if self.description.is_empty() {
            "N/A"
        } else {
            &self.description
        }
    }
}

/// One row of the daily summary, as returned by the spreadsheet service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLineItem {
    #[serde(default = "not_available", deserialize_with = "cell_text")]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, deserialize_with = "cell_text")]
    pub category: String,
    #[serde(default, deserialize_with = "cell_text")]
    pub payment_method: String,
    #[serde(default, rename = "type", deserialize_with = "cell_text")]
    pub transaction_type: String,
}

/// Everything recorded on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: chrono::NaiveDate,
    pub items: Vec<DailyLineItem>,
    /// Sum of the day's expenses (computed by the spreadsheet service)
    pub total: f64,
}

/// All-time income/expense totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllTimeSummary {
    #[serde(rename = "totalIncome", default)]
    pub total_income: f64,
    #[serde(rename = "totalExpense", default)]
    pub total_expense: f64,
    #[serde(rename = "expenseMinusIncome", default)]
    pub expense_minus_income: f64,
}

fn not_available() -> String {
    "N/A".to_string()
}

/// Spreadsheet cells arrive as whatever type the sheet inferred ("2024" becomes
/// a number), so any scalar is accepted as text.
fn cell_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a cell value, got {}", other))),
    }
}

/// Format an amount as Rupiah, e.g. `Rp25,000`
pub fn format_rupiah(value: f64) -> String {
    format!("Rp{}", group_thousands(value))
}

/// Insert comma thousands separators, keeping any fractional part
pub fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let text = value.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };
    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, group_digits(whole), fraction),
        None => format!("{}{}", sign, group_digits(whole)),
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_from_label() {
        assert_eq!(TransactionType::from_label("income"), TransactionType::Income);
        assert_eq!(TransactionType::from_label(" Income "), TransactionType::Income);
        assert_eq!(TransactionType::from_label("expense"), TransactionType::Expense);
        assert_eq!(TransactionType::from_label("transfer"), TransactionType::Expense);
    }

    #[test]
    fn test_amount_positive() {
        assert!(Amount::positive(25000.into()).is_some());
        assert!(Amount::positive(serde_json::Number::from_f64(0.5).unwrap()).is_some());
        assert!(Amount::positive(0.into()).is_none());
        assert!(Amount::positive((-10).into()).is_none());
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::from(25000).to_string(), "25,000");
        assert_eq!(Amount::from(500).to_string(), "500");
        let fractional = Amount::positive(serde_json::Number::from_f64(1234.5).unwrap()).unwrap();
        assert_eq!(fractional.to_string(), "1,234.5");
    }

    #[test]
    fn test_format_rupiah() {
        assert_eq!(format_rupiah(25000.0), "Rp25,000");
        assert_eq!(format_rupiah(1_500_000.0), "Rp1,500,000");
        assert_eq!(format_rupiah(0.0), "Rp0");
        assert_eq!(format_rupiah(-75000.0), "Rp-75,000");
        assert_eq!(format_rupiah(999.25), "Rp999.25");
    }

    #[test]
    fn test_record_serializes_without_absent_fields() {
        let record = TransactionRecord {
            transaction_type: TransactionType::Expense,
            amount: Amount::from(25000),
            description: "nasi goreng".into(),
            payment_method: Some("ShopeePay".into()),
            category: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["transaction_type"], "expense");
        assert_eq!(json["amount"], 25000);
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_daily_line_item_defaults() {
        let item: DailyLineItem = serde_json::from_str(r#"{"amount": 12000}"#).unwrap();
        assert_eq!(item.description, "N/A");
        assert_eq!(item.amount, 12000.0);
        assert!(item.category.is_empty());
    }

    #[test]
    fn test_daily_line_item_accepts_non_string_cells() {
        let item: DailyLineItem = serde_json::from_str(
            r#"{"description": 2024, "amount": 5000, "category": null, "payment_method": true}"#,
        )
        .unwrap();
        assert_eq!(item.description, "2024");
        assert!(item.category.is_empty());
        assert_eq!(item.payment_method, "true");

        assert!(serde_json::from_str::<DailyLineItem>(r#"{"description": ["a"]}"#).is_err());
    }

    #[test]
    fn test_all_time_summary_field_names() {
        let summary: AllTimeSummary = serde_json::from_str(
            r#"{"totalExpense": 300000, "totalIncome": 500000, "expenseMinusIncome": -200000}"#,
        )
        .unwrap();
        assert_eq!(summary.total_income, 500000.0);
        assert_eq!(summary.expense_minus_income, -200000.0);
    }
}
