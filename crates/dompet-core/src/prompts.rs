//! Prompt for transaction parsing
//!
//! The template is embedded in the binary and rendered with simple
//! mustache-style `{{var}}` replacement. Rendering is pure: the same utterance
//! always yields the same prompt, which is the only lever available for keeping
//! the model's output format stable.
//!
//! Layout of the rendered prompt (order matters for parse success):
//! 1. Field list with semantics, closed payment-method and category sets
//! 2. Two worked examples (income, then expense), each replying with JSON only
//! 3. The user's utterance, quoted, after a final "reply with JSON only" line

use crate::models::{CATEGORIES, DEFAULT_PAYMENT_METHOD, INCOME_CATEGORY, PAYMENT_METHODS};

/// Embedded prompt template
const PARSE_TRANSACTION: &str = include_str!("../../../prompts/parse_transaction.md");

/// Build the completion prompt for one utterance
pub fn build_prompt(utterance: &str) -> String {
    let vars = [
        ("payment_methods", PAYMENT_METHODS.join(", ")),
        ("categories", CATEGORIES.join(", ")),
        ("default_payment_method", DEFAULT_PAYMENT_METHOD.to_string()),
        ("income_category", INCOME_CATEGORY.to_string()),
    ];

    let mut rendered = PARSE_TRANSACTION.to_string();
    for (key, value) in &vars {
        rendered = render_var(&rendered, key, value);
    }
    // The utterance goes in last so text inside it is never treated as a placeholder.
    let rendered = render_var(&rendered, "input", utterance);

    format!("\n{}", rendered)
}

fn render_var(template: &str, key: &str, value: &str) -> String {
    let pattern = format!("{{{{{}}}}}", key);
    template.replace(&pattern, value)
}
