//! JSON extraction from completion text
//!
//! Models often wrap the JSON payload in commentary ("Sure! {...} Thanks").
//! [`extract_fields`] finds the first `{` and its matching `}` and decodes that
//! slice as a JSON object. Only the first candidate is tried.
//!
//! The scan tracks string literals and escapes, so nested objects and braces
//! inside string values are matched correctly. It is still a heuristic: a stray
//! `{` in the commentary before the payload makes extraction fail.
//!
//! Field presence and types are not checked here; that is the validator's job.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, warn};

/// Decoded but unvalidated fields
pub type Fields = Map<String, Value>;

/// Why no fields could be extracted
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No JSON object found in AI response")]
    NoObject,

    #[error("Invalid JSON from AI: {source} | Raw: {raw}")]
    Malformed {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}

/// Extract the first JSON object from a completion
///
/// Logs a warning when there is no candidate and an error (with the raw text)
/// when the candidate does not decode.
pub fn extract_fields(text: &str) -> Result<Fields, ExtractError> {
    let Some(candidate) = first_object_slice(text) else {
        warn!("No JSON object found in the text: {}", text);
        return Err(ExtractError::NoObject);
    };

    match serde_json::from_str::<Fields>(candidate) {
        Ok(fields) => Ok(fields),
        Err(e) => {
            error!("Failed to decode JSON from text: {}\nText was: {}", e, text);
            Err(ExtractError::Malformed {
                source: e,
                raw: truncate(candidate, 200),
            })
        }
    }
}

/// Locate the first brace-balanced `{...}` region
fn first_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Truncate long payloads for error messages
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
