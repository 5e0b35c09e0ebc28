//! Pulls a structured [`SymptomAnalysis`] out of free model text.
//!
//! The model is asked for JSON but nothing guarantees it: replies may wrap
//! the object in prose or code fences, or not contain one at all. The first
//! balanced `{...}` block is taken and validated against the full schema.

use crate::models::{Severity, SymptomAnalysis, Urgency};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("reply contains no JSON object")]
    NoJsonObject,

    #[error("reply JSON does not match the analysis schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("analysis field `{0}` is empty")]
    EmptyField(&'static str),
}

/// Strict wire shape. Missing fields, unknown enum values and non-string
/// list items all fail deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisWire {
    severity: Severity,
    response: String,
    recommendations: Vec<String>,
    suggestions: Vec<String>,
    urgency: Urgency,
    possible_causes: Vec<String>,
}

/// Return the first balanced `{...}` substring of `text`. Braces inside
/// JSON string literals are ignored. An opening brace that never closes is
/// skipped and the search resumes at the next one. `None` if no object
/// closes.
pub fn first_json_object(text: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        if let Some(len) = balanced_len(&text[start..]) {
            return Some(&text[start..start + len]);
        }
        from = start + 1;
    }
    None
}

/// Byte length of the object opening at the start of `text`, if it closes.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a model reply into a validated analysis.
pub fn parse_analysis(reply: &str) -> Result<SymptomAnalysis, ExtractError> {
    let block = first_json_object(reply).ok_or(ExtractError::NoJsonObject)?;
    let wire: AnalysisWire = serde_json::from_str(block)?;

    if wire.response.trim().is_empty() {
        return Err(ExtractError::EmptyField("response"));
    }

    Ok(SymptomAnalysis {
        severity: wire.severity,
        response: wire.response,
        recommendations: wire.recommendations,
        suggestions: wire.suggestions,
        urgency: wire.urgency,
        possible_causes: wire.possible_causes,
    })
}
