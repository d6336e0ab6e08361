//! Event definitions
//!
//! Defines the record type describing a single mutation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single mutation recorded in the transaction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Sequence ID, assigned by the log writer. Zero until then.
    pub id: u64,

    /// Kind of mutation
    pub kind: EventType,

    /// Key being assigned or removed
    pub key: String,

    /// New value for a Put, empty for a Delete
    pub value: String,
}

/// Mutation kinds, with their on-disk codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    Delete = 1,
    Put = 2,
}

impl EventType {
    /// Numeric code written to the log
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric code read from the log
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventType::Delete),
            2 => Some(EventType::Put),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Delete => f.write_str("DELETE"),
            EventType::Put => f.write_str("PUT"),
        }
    }
}

impl Event {
    /// A Put event awaiting an ID. The value is normalized.
    pub fn put(key: impl Into<String>, value: &str) -> Self {
        Self {
            id: 0,
            kind: EventType::Put,
            key: key.into(),
            value: normalize_value(value),
        }
    }

    /// A Delete event awaiting an ID
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: EventType::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Same event carrying the given sequence ID
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventType::Put => write!(f, "#{} {} {:?} = {:?}", self.id, self.kind, self.key, self.value),
            EventType::Delete => write!(f, "#{} {} {:?}", self.id, self.kind, self.key),
        }
    }
}

/// Canonical form of a value as stored and logged.
///
/// Embedded newlines are removed and trailing whitespace is trimmed, so a
/// value read back from the log equals the one held by the store.
pub fn normalize_value(value: &str) -> String {
    let stripped: String = value.chars().filter(|&c| c != '\n').collect();
    stripped.trim_end().to_string()
}
