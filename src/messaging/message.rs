//! Broker-agnostic record types.
//!
//! Providers translate their native messages into [`InboundRecord`] and
//! accept [`OutboundRecord`] for publishing, so the retry chain and the
//! processing handler never touch rdkafka types directly.

use serde::{Deserialize, Serialize};

/// A record read from a consumed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Option<Vec<u8>>,
    pub headers: Vec<(String, Vec<u8>)>,
}

impl InboundRecord {
    /// Last value of the named header
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_slice())
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name)
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Header parsed as a decimal integer
    pub fn header_i64(&self, name: &str) -> Option<i64> {
        self.header_str(name)
            .and_then(|value| value.trim().parse().ok())
    }

    /// `topic[partition]@offset`, used in log lines and error messages
    pub fn position(&self) -> String {
        format!("{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}

/// A record to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub headers: Vec<(String, Vec<u8>)>,
}

impl OutboundRecord {
    pub fn new(topic: impl Into<String>, key: Option<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            key,
            payload,
            headers: Vec::new(),
        }
    }

    /// Copy of a consumed record addressed to another topic.
    ///
    /// Key, payload bytes and headers are carried over unchanged.
    pub fn forward(record: &InboundRecord, topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            key: record.key.clone(),
            payload: record.payload.clone().unwrap_or_default(),
            headers: record.headers.clone(),
        }
    }

    /// Set a header, replacing any existing value under the same name
    pub fn with_header(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.headers.retain(|(key, _)| key != name);
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_slice())
    }
}

/// Where the broker stored a published record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}
