//! Best-effort decoding of the model's reply into a [`QueryIntent`].
//!
//! Two stages: the first JSON object embedded in the text, then a bare
//! `SELECT ... ;` scan. Anything else degrades to an empty intent with zero
//! confidence; the confidence gate turns that into a clarification.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::chat::models::QueryIntent;

pub const DEFAULT_EXPLANATION: &str = "Query generated successfully";
pub const DEFAULT_CONFIDENCE: f64 = 0.8;
pub const FALLBACK_EXPLANATION: &str = "Extracted a SQL query from an unstructured model reply";
pub const FALLBACK_CONFIDENCE: f64 = 0.6;
pub const PARSE_FAILED_EXPLANATION: &str = "Failed to parse the model response";

fn select_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)\bSELECT\b.*?;").expect("static regex is valid"))
}

pub fn parse_response(raw: &str) -> QueryIntent {
    if let Some(object) = first_json_object(raw) {
        return intent_from_json(&object);
    }

    if let Some(found) = select_pattern().find(raw) {
        return QueryIntent {
            sql_query: found.as_str().trim().to_string(),
            explanation: FALLBACK_EXPLANATION.to_string(),
            confidence: FALLBACK_CONFIDENCE,
            suggested_table: None,
        };
    }

    QueryIntent {
        sql_query: String::new(),
        explanation: PARSE_FAILED_EXPLANATION.to_string(),
        confidence: 0.0,
        suggested_table: None,
    }
}

/// Maps any self-reported confidence onto `[0, 1]`. Percent-style values
/// (above 1, up to 100) are scaled down first.
pub fn normalize_confidence(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scaled = if value > 1.0 && value <= 100.0 { value / 100.0 } else { value };
    scaled.clamp(0.0, 1.0)
}

fn intent_from_json(object: &serde_json::Map<String, Value>) -> QueryIntent {
    let sql_query = object
        .get("sql")
        .and_then(Value::as_str)
        .map(strip_code_fence)
        .unwrap_or_default();

    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());

    let confidence = object
        .get("confidence")
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
            _ => None,
        })
        .unwrap_or(DEFAULT_CONFIDENCE);

    let suggested_table = object
        .get("suggestedTable")
        .or_else(|| object.get("suggested_table"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    QueryIntent {
        sql_query,
        explanation,
        confidence: normalize_confidence(confidence),
        suggested_table,
    }
}

/// Tries each `{` in turn and returns the first balanced span that parses as a JSON object.
fn first_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = matching_brace(&text[start..]) {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..start + end]) {
                return Some(map);
            }
        }
        search_from = start + 1;
    }
    None
}

/// Byte length of the brace-balanced span starting at `text[0] == '{'`,
/// ignoring braces inside string literals.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
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
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_code_fence(sql: &str) -> String {
    let trimmed = sql.trim();
    let inner = trimmed
        .strip_prefix("```sql")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.strip_suffix("```").unwrap_or(inner).trim().to_string()
}
