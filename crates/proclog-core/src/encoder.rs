//! Line encoding.
//!
//! Pure functions: no shared state and no I/O. Encoding never fails; values
//! that cannot be represented degrade to text.

use std::fmt::Debug;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use serde_json::Value;

use crate::entry::EntryRef;
use crate::level::{LogFormat, LogLevel};

/// Render `now` as RFC 3339 with seconds precision (`Z` for a zero offset).
pub fn format_timestamp(now: &DateTime<FixedOffset>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert any serializable value into a details payload.
///
/// Values serde_json cannot represent (e.g. maps with non-string keys) fall
/// back to their `Debug` text.
pub fn details_from<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{:?}", value)))
}

/// Encode one event as a newline-terminated line.
pub fn encode(
    now: &DateTime<FixedOffset>,
    level: LogLevel,
    process: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
    format: LogFormat,
) -> Vec<u8> {
    let timestamp = format_timestamp(now);
    let details = details.filter(|d| !d.is_null());

    let mut line = match format {
        LogFormat::Json => {
            let entry = EntryRef {
                timestamp: &timestamp,
                level,
                process,
                action,
                message,
                details,
            };
            match serde_json::to_vec(&entry) {
                Ok(bytes) => bytes,
                Err(_) => encode_text(&timestamp, level, process, action, message, details),
            }
        }
        LogFormat::Text => encode_text(&timestamp, level, process, action, message, details),
    };
    line.push(b'\n');
    line
}

fn encode_text(
    timestamp: &str,
    level: LogLevel,
    process: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
) -> Vec<u8> {
    let mut text = format!(
        "[{}] {} | {} | {} | {}",
        timestamp,
        level.as_str(),
        process,
        action,
        message
    );
    if let Some(details) = details {
        text.push_str(" | ");
        text.push_str(&format_details(details));
    }
    text.into_bytes()
}

/// Flatten details for the readable format.
///
/// Objects become space-joined `key=value` pairs, strings pass through, and
/// anything else is squashed from its JSON form. The last case is lossy and
/// only meant for scanning by eye.
pub fn format_details(details: &Value) -> String {
    match details {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{}={}", key, display_value(value)))
            .collect::<Vec<_>>()
            .join(" "),
        other => flatten_json(&other.to_string()),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_json(json: &str) -> String {
    let trimmed = json.strip_prefix('{').unwrap_or(json);
    let trimmed = trimmed.strip_suffix('}').unwrap_or(trimmed);
    trimmed
        .replace("\":", "=")
        .replace("\",", " ")
        .replace('"', "")
}
