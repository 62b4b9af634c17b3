//! Status entries stored in a task log
//!
//! Logs hold strings. Structured statuses are serialized to JSON on push and
//! recovered on read by looking at the first character: anything starting
//! with `{` is parsed as JSON, everything else is returned verbatim.
//!
//! JSON strings are text: they are stored verbatim, never quoted.
//!
//! Known limitation: a plain text status that itself starts with `{` and is
//! valid JSON comes back as [`Status::Structured`]. Structured values that are
//! not JSON objects (numbers, arrays, booleans) come back as their JSON text.
//! [`encode`] and [`decode`] are the only functions that know about this, so
//! an explicit type tag can replace the heuristic without touching callers.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A single progress entry
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Stored verbatim
    Text(String),
    /// Stored as compact JSON
    Structured(Value),
}

impl Status {
    /// Serialize any value into a structured status
    pub fn structured<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Status::from)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Status::Text(text) => Some(text),
            Status::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Status::Text(_) => None,
            Status::Structured(value) => Some(value),
        }
    }
}

impl From<&str> for Status {
    fn from(text: &str) -> Self {
        Status::Text(text.to_string())
    }
}

impl From<String> for Status {
    fn from(text: String) -> Self {
        Status::Text(text)
    }
}

impl From<Value> for Status {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Status::Text(text),
            other => Status::Structured(other),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Stored representation of a status
pub fn encode(status: &Status) -> String {
    match status {
        Status::Text(text) | Status::Structured(Value::String(text)) => text.clone(),
        Status::Structured(value) => value.to_string(),
    }
}

/// Reconstruct a status from its stored representation
///
/// A `{`-prefixed entry that fails to parse is returned as text.
pub fn decode(raw: String) -> Status {
    if raw.starts_with('{') {
        match serde_json::from_str(&raw) {
            Ok(value) => Status::Structured(value),
            Err(_) => Status::Text(raw),
        }
    } else {
        Status::Text(raw)
    }
}
