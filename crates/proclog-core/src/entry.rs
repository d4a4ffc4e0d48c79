//! Structured log line schema.
//!
//! Each structured line is a self-contained JSON object, so a file can be
//! consumed line by line (`jq`, `grep`) without any framing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::LogLevel;

/// One structured log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 timestamp with offset (e.g., "2024-01-15T09:30:00+01:00")
    pub timestamp: String,

    /// DEBUG, INFO, WARN, ERROR or FATAL
    pub level: LogLevel,

    /// Process (directory) name
    pub process: String,

    pub action: String,

    pub message: String,

    /// Optional structured payload; the key is absent when there is none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LogEntry {
    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Borrowed view used on the write path to avoid cloning every field.
#[derive(Serialize)]
pub(crate) struct EntryRef<'a> {
    pub timestamp: &'a str,
    pub level: LogLevel,
    pub process: &'a str,
    pub action: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a Value>,
}
