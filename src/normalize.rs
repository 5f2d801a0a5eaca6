//! Raw Graph payload to normalized message conversion.
//!
//! Graph message payloads have no guaranteed shape, so every field gets a
//! safe default instead of a validation error. This is a deliberate
//! tolerance policy: normalization is total and never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::types::TeamsMessage;

/// Angle-bracket tag removal. Graph bodies are HTML; a simple tag strip is
/// enough for keyword matching and prompts, no full HTML parsing.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Convert raw message payloads into normalized messages.
///
/// Output has the same length and order as the input.
pub fn normalize_messages(payloads: &[Value]) -> Vec<TeamsMessage> {
    payloads.iter().map(normalize_message).collect()
}

fn normalize_message(payload: &Value) -> TeamsMessage {
    let content = payload
        .pointer("/body/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let content = TAG_RE.replace_all(content, "").trim().to_string();

    let sender = payload
        .pointer("/from/user/displayName")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let created_at = payload
        .get("createdDateTime")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    let mentions = payload
        .get("mentions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|m| m.pointer("/mentioned/user/displayName"))
                .filter_map(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    TeamsMessage {
        id,
        sender,
        content,
        created_at,
        mentions,
    }
}
