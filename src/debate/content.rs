//! Reply content decoding
//!
//! Replies are either a JSON object carrying one or two named text fields, or
//! plain text. Decoding never fails: anything that is not a JSON object is
//! treated as plain text and shown verbatim.

use serde_json::{Map, Value};

/// Result of trying to read a reply as structured content
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedContent {
    Structured(Map<String, Value>),
    PlainText(String),
}

impl DecodedContent {
    /// String value of `field`, if the content is structured and carries one
    pub fn field(&self, field: &str) -> Option<&str> {
        match self {
            DecodedContent::Structured(fields) => fields.get(field).and_then(Value::as_str),
            DecodedContent::PlainText(_) => None,
        }
    }
}

pub fn decode(raw: &str) -> DecodedContent {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => DecodedContent::Structured(fields),
        _ => DecodedContent::PlainText(raw.to_string()),
    }
}

/// Text to show for a single-turn reply; falls back to the raw content
pub fn display_text(raw: &str, field: &str) -> String {
    decode(raw)
        .field(field)
        .map_or_else(|| raw.to_string(), str::to_string)
}

/// Both sides of a paired reply, or a single fallback line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTurns {
    Pair { first: String, second: String },
    Single(String),
}

pub fn paired_turns(raw: &str, first_field: &str, second_field: &str) -> ReplyTurns {
    let decoded = decode(raw);
    match (decoded.field(first_field), decoded.field(second_field)) {
        (Some(first), Some(second)) => ReplyTurns::Pair {
            first: first.to_string(),
            second: second.to_string(),
        },
        _ => ReplyTurns::Single(raw.to_string()),
    }
}
