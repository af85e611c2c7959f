//! Per-message retry flag and the invalid-message router.
//!
//! The flag belongs to the handling of exactly one record and is passed to
//! the router by value-owning code, so nothing is shared between workers.
//! The router fails closed: a republish whose flag was not affirmatively set
//! to retryable is redirected to the invalid topic.

use tracing::{info, warn};

use crate::messaging::OutboundRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFlags {
    retryable: bool,
}

impl MessageFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_retryable(&mut self, retryable: bool) {
        self.retryable = retryable;
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn clear(&mut self) {
        self.retryable = false;
    }
}

#[derive(Debug, Clone)]
pub struct InvalidMessageRouter {
    invalid_topic: String,
}

impl InvalidMessageRouter {
    pub fn new(invalid_topic: impl Into<String>) -> Self {
        Self {
            invalid_topic: invalid_topic.into(),
        }
    }

    pub fn invalid_topic(&self) -> &str {
        &self.invalid_topic
    }

    /// Decide the final destination of one republish.
    ///
    /// Retryable: the record passes unchanged and the flag is cleared.
    /// Otherwise: same key, payload and headers, addressed to the invalid topic.
    pub fn route(&self, record: OutboundRecord, flags: &mut MessageFlags) -> OutboundRecord {
        if flags.is_retryable() {
            flags.clear();
            return record;
        }

        if record.topic != self.invalid_topic {
            warn!(
                intended_topic = %record.topic,
                invalid_topic = %self.invalid_topic,
                "Redirecting non-retryable message to invalid topic"
            );
        } else {
            info!(invalid_topic = %self.invalid_topic, "Routing message to invalid topic");
        }

        OutboundRecord {
            topic: self.invalid_topic.clone(),
            ..record
        }
    }
}
