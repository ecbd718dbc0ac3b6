//! Tagged value union and its text codec
//!
//! Stored values are one of three kinds: integer, string, or structured
//! document. Values serialize to JSON text on write; decoding is permissive
//! and never fails — text that does not parse as JSON comes back as a raw
//! `Value::Str`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored value.
///
/// Explicit tagged variant, one constructor per kind, each with its own
/// serialization rule:
///
/// - `Int` → JSON number literal (`42`)
/// - `Str` → JSON string literal (`"hello"`)
/// - `Doc` → compact JSON document (objects, arrays, bools, floats, null)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value.
    Int(i64),
    /// String value.
    Str(String),
    /// Structured document (any JSON value that is not an i64 or string).
    Doc(serde_json::Value),
}

impl Value {
    /// Serialize to the stored text representation.
    pub fn encode(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Str(s) => serde_json::Value::String(s.clone()).to_string(),
            Value::Doc(doc) => doc.to_string(),
        }
    }

    /// Decode a stored text representation.
    ///
    /// Infallible: text that fails to parse as JSON is returned unchanged as
    /// `Value::Str`.
    pub fn decode(text: &str) -> Value {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Doc(serde_json::Value::Number(n)),
            },
            Ok(serde_json::Value::String(s)) => Value::Str(s),
            Ok(doc) => Value::Doc(doc),
            Err(_) => Value::Str(text.to_string()),
        }
    }

    /// Integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// String payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Document payload, if this is a `Doc`.
    pub fn as_doc(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Doc(doc) => Some(doc),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Doc(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            doc => Value::Doc(doc),
        }
    }
}
