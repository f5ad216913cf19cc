//! Record validation
//!
//! The one hard rule: `amount` must be a JSON number strictly greater than zero.
//! Everything else passes through as the model produced it. Payment methods and
//! categories outside the known sets are logged but accepted.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::ai::Fields;
use crate::models::{Amount, TransactionRecord, TransactionType, CATEGORIES, PAYMENT_METHODS};

/// Why a decoded record cannot be persisted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("amount is missing")]
    MissingAmount,

    #[error("amount is not a number: {0}")]
    NonNumericAmount(Value),

    #[error("amount must be greater than zero: {0}")]
    NonPositiveAmount(serde_json::Number),
}

impl ValidationError {
    /// The offending value as shown to the user
    pub fn offending_value(&self) -> String {
        match self {
            Self::MissingAmount => "tidak ada".to_string(),
            Self::NonNumericAmount(value) => value.to_string(),
            Self::NonPositiveAmount(number) => number.to_string(),
        }
    }
}

/// Result of validating extracted fields
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Admissible(TransactionRecord),
    Rejected(ValidationError),
}

impl Validation {
    pub fn is_admissible(&self) -> bool {
        matches!(self, Self::Admissible(_))
    }
}

/// Check extracted fields and build a record if they are admissible
pub fn validate(fields: &Fields) -> Validation {
    let amount = match check_amount(fields.get("amount")) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(
                "Invalid or missing 'amount' in extracted data: {}. Skipping spreadsheet upload.",
                e.offending_value()
            );
            return Validation::Rejected(e);
        }
    };

    let transaction_type = fields
        .get("transaction_type")
        .and_then(Value::as_str)
        .map(TransactionType::from_label)
        .unwrap_or_default();

    let payment_method = text_field(fields, "payment_method");
    let category = text_field(fields, "category");
    warn_if_unknown("payment_method", payment_method.as_deref(), PAYMENT_METHODS);
    warn_if_unknown("category", category.as_deref(), CATEGORIES);

    Validation::Admissible(TransactionRecord {
        transaction_type,
        amount,
        description: text_field(fields, "description").unwrap_or_default(),
        payment_method,
        category,
    })
}

fn check_amount(value: Option<&Value>) -> Result<Amount, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingAmount),
        Some(Value::Number(number)) => Amount::positive(number.clone())
            .ok_or_else(|| ValidationError::NonPositiveAmount(number.clone())),
        Some(other) => Err(ValidationError::NonNumericAmount(other.clone())),
    }
}

/// Read a field as text; non-string scalars are kept in their JSON form
fn text_field(fields: &Fields, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn warn_if_unknown(field: &str, value: Option<&str>, allowed: &[&str]) {
    if let Some(value) = value {
        if !allowed.contains(&value) {
            warn!(
                field = field,
                value = value,
                "Value outside the known set, passing through"
            );
        }
    }
}
