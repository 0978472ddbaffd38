//! Bounded history of the messages exchanged over a connection.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::MESSAGE_LOG_CAPACITY;
use crate::error::Error;

/// Which side produced a message.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// Message body. Contents are opaque; structured values are only encoded.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    /// Wire form of the payload. JSON objects encode with sorted keys.
    pub fn encode(&self) -> Result<String, Error> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Json(value) => Ok(serde_json::to_string(value)?),
        }
    }

    /// Interpret incoming text. JSON objects and arrays become [`Payload::Json`],
    /// anything else stays text.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Self::Json(value),
            _ => Self::Text(text.to_owned()),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// One logged message. Never modified after creation.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub direction: Direction,
    pub payload: Payload,
    /// Text exactly as it went over the wire
    pub raw: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    #[must_use]
    pub fn new(direction: Direction, payload: Payload, raw: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction,
            payload,
            raw,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn sent(payload: Payload, raw: String) -> Self {
        Self::new(Direction::Sent, payload, Some(raw))
    }

    #[must_use]
    pub fn received(raw: String) -> Self {
        Self::new(Direction::Received, Payload::decode(&raw), Some(raw))
    }
}

/// Fixed-capacity FIFO of [`Message`]s; the oldest record is evicted on overflow.
#[derive(Debug, Clone)]
pub struct MessageLog {
    records: VecDeque<Message>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_LOG_CAPACITY)
    }

    /// A log holding at most `capacity` records. A capacity of zero keeps nothing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, record: Message) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Ordered copy of the current records, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
