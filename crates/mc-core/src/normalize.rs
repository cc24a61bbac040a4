//! Record normalization: one loosely-shaped JSON task object in, one
//! [`TaskRecord`] out.
//!
//! Task files are written by several agents and scripts that disagree on key
//! names, value types and date formats. Every field has a named fallback rule
//! so normalization itself cannot fail; files that are not JSON objects at all
//! are rejected earlier by the loader.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::types::{Priority, TaskRecord, TaskStatus, TokenUsageEntry};

const DEFAULT_TITLE: &str = "Untitled";

/// Normalize a raw task object.
///
/// `fallback_id` is used when the record carries no usable `id` (the loader
/// passes the file stem). `now_ms` stands in for any missing or unparseable
/// date.
pub fn normalize_task(raw: &Map<String, Value>, fallback_id: &str, now_ms: i64) -> TaskRecord {
    let id = first_truthy(raw, &["id"])
        .map(coerce_string)
        .unwrap_or_else(|| fallback_id.to_string());
    let title = first_truthy(raw, &["title"])
        .map(coerce_string)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = first_truthy(raw, &["description"])
        .map(coerce_string)
        .unwrap_or_default();

    TaskRecord {
        id,
        title,
        description,
        status: extract_status(raw),
        priority: extract_priority(raw),
        assignee_id: extract_assignee(raw),
        tags: extract_tags(raw),
        created_at: date_or_now(raw, &["created_at", "created"], now_ms),
        updated_at: Some(date_or_now(
            raw,
            &["completed_at", "completed", "updated_at"],
            now_ms,
        )),
        usage: raw.get("usage").and_then(parse_usage),
    }
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn extract_status(raw: &Map<String, Value>) -> TaskStatus {
    raw.get("status")
        .and_then(Value::as_str)
        .map(TaskStatus::from_raw)
        .unwrap_or(TaskStatus::Inbox)
}

fn extract_priority(raw: &Map<String, Value>) -> Priority {
    raw.get("priority")
        .and_then(Value::as_str)
        .map(Priority::from_raw)
        .unwrap_or(Priority::Normal)
}

fn extract_assignee(raw: &Map<String, Value>) -> Option<String> {
    if let Some(v) = first_truthy(raw, &["claimed_by", "assignee"]) {
        return Some(coerce_string(v));
    }
    raw.get("deliverables")
        .and_then(Value::as_array)
        .and_then(|d| d.first())
        .and_then(Value::as_object)
        .and_then(|first| first_truthy(first, &["assignee"]))
        .map(coerce_string)
}

fn extract_tags(raw: &Map<String, Value>) -> Vec<String> {
    if let Some(tags) = raw.get("tags").and_then(Value::as_array) {
        return tags.iter().map(coerce_string).collect();
    }
    match first_truthy(raw, &["type"]) {
        Some(kind) => vec![coerce_string(kind)],
        None => Vec::new(),
    }
}

fn date_or_now(raw: &Map<String, Value>, keys: &[&str], now_ms: i64) -> i64 {
    first_truthy(raw, keys)
        .and_then(parse_date)
        .unwrap_or(now_ms)
}

/// Parse the `usage` array. Returns `None` when nothing usable remains.
pub fn parse_usage(raw: &Value) -> Option<Vec<TokenUsageEntry>> {
    let items = raw.as_array()?;
    let entries: Vec<TokenUsageEntry> = items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(parse_usage_entry)
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

fn parse_usage_entry(r: &Map<String, Value>) -> Option<TokenUsageEntry> {
    let input_tokens = first_present(r, &["inputTokens", "input_tokens"])
        .map(coerce_count)
        .unwrap_or(0);
    let output_tokens = first_present(r, &["outputTokens", "output_tokens"])
        .map(coerce_count)
        .unwrap_or(0);
    if input_tokens == 0 && output_tokens == 0 {
        return None;
    }
    Some(TokenUsageEntry {
        input_tokens,
        output_tokens,
        cache_read_tokens: first_present(r, &["cacheReadTokens", "cache_read_tokens"])
            .map(coerce_count),
        cache_write_tokens: first_present(r, &["cacheWriteTokens", "cache_write_tokens"])
            .map(coerce_count),
        model: first_present(r, &["model"]).map(coerce_string),
        provider: first_present(r, &["provider"]).map(coerce_string),
        timestamp: first_present(r, &["timestamp"]).and_then(parse_date),
    })
}

// ---------------------------------------------------------------------------
// Value coercion helpers
// ---------------------------------------------------------------------------

/// Loose truthiness: null, false, zero and the empty string are falsy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_truthy<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| is_truthy(v))
}

fn first_present<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

/// Render any JSON value as display text. Strings are taken verbatim,
/// arrays join their elements with commas (nulls render empty) and objects
/// render as `[object Object]`.
pub fn coerce_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Coerce to a non-negative token count. Non-numeric input counts as zero,
/// negatives clamp to zero and fractions truncate.
pub fn coerce_count(v: &Value) -> u64 {
    let f = match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return u;
            }
            n.as_f64().unwrap_or(0.0)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if f.is_finite() && f > 0.0 {
        f.trunc() as u64
    } else {
        0
    }
}

/// Parse a date value into epoch milliseconds.
///
/// Numbers are taken as epoch millis. Strings may be RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS` (read as UTC), a bare `YYYY-MM-DD`, RFC 2822, or a
/// numeric millisecond string.
pub fn parse_date(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    s.parse::<i64>().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
