//! # System Constants
//!
//! Topic naming, delivery header names and fixed message values shared by the
//! retry chain, the codec and the processing handler.

use std::time::Duration;

/// Suffix appended to the main topic for the k-th retry topic (`<main>-retry-<k>`).
pub const RETRY_TOPIC_SUFFIX: &str = "-retry-";

/// Suffix appended to the main topic for the dead-letter topic.
pub const DEAD_LETTER_TOPIC_SUFFIX: &str = "-error";

/// `document_type` stamped on every sign request produced by this service.
pub const CERTIFIED_COPY_DOCUMENT_TYPE: &str = "certified-copy";

/// Default location of the filing history description table.
pub const DEFAULT_FILING_HISTORY_DESCRIPTIONS_PATH: &str =
    "api-enumerations/filing_history_descriptions.yml";

/// Longest a consumer-group member may go between polls before it is evicted.
/// A retry record's backoff is waited out between polls, so the backoff delay
/// must stay below it.
pub const KAFKA_MAX_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Top-level key of the description table.
pub const FILING_HISTORY_DESCRIPTION_KEY: &str = "description";

/// Headers written on every republish within the retry chain.
pub mod headers {
    /// Delivery attempt number of the republished record (1 = first retry).
    pub const DELIVERY_ATTEMPT: &str = "delivery-attempt";
    /// Topic the record was first consumed from.
    pub const ORIGINAL_TOPIC: &str = "original-topic";
    pub const ORIGINAL_PARTITION: &str = "original-partition";
    pub const ORIGINAL_OFFSET: &str = "original-offset";
    /// `retryable` or `non_retryable`.
    pub const FAILURE_KIND: &str = "failure-kind";
    pub const FAILURE_MESSAGE: &str = "failure-message";
    /// Epoch millis before which the record must not be processed.
    pub const BACKOFF_DUE_AT: &str = "backoff-due-at";
}

/// Environment variables the process refuses to start without.
pub mod env {
    pub const BOOTSTRAP_SERVER_URL: &str = "BOOTSTRAP_SERVER_URL";
    pub const GROUP_ID: &str = "GROUP_ID";
    pub const ITEM_ORDERED_CERTIFIED_COPY_TOPIC: &str = "ITEM_ORDERED_CERTIFIED_COPY_TOPIC";
    pub const SIGN_DIGITAL_DOCUMENT_TOPIC: &str = "SIGN_DIGITAL_DOCUMENT_TOPIC";
    pub const INVALID_ITEM_ORDERED_CERTIFIED_COPY_TOPIC: &str =
        "INVALID_ITEM_ORDERED_CERTIFIED_COPY_TOPIC";
    pub const MAX_ATTEMPTS: &str = "MAX_ATTEMPTS";
    pub const BACKOFF_DELAY: &str = "BACKOFF_DELAY";
    pub const CONCURRENT_LISTENER_INSTANCES: &str = "CONCURRENT_LISTENER_INSTANCES";
    pub const API_URL: &str = "API_URL";
    pub const DOCUMENT_API_LOCAL_URL: &str = "DOCUMENT_API_LOCAL_URL";
    pub const CHS_API_KEY: &str = "CHS_API_KEY";

    pub const REQUIRED: [&str; 11] = [
        BOOTSTRAP_SERVER_URL,
        GROUP_ID,
        ITEM_ORDERED_CERTIFIED_COPY_TOPIC,
        SIGN_DIGITAL_DOCUMENT_TOPIC,
        INVALID_ITEM_ORDERED_CERTIFIED_COPY_TOPIC,
        MAX_ATTEMPTS,
        BACKOFF_DELAY,
        CONCURRENT_LISTENER_INSTANCES,
        API_URL,
        DOCUMENT_API_LOCAL_URL,
        CHS_API_KEY,
    ];

    pub const FILING_HISTORY_DESCRIPTIONS_PATH: &str = "FILING_HISTORY_DESCRIPTIONS_PATH";
    pub const HTTP_TIMEOUT_SECONDS: &str = "HTTP_TIMEOUT_SECONDS";
    pub const POLL_TIMEOUT_MILLIS: &str = "POLL_TIMEOUT_MILLIS";
}
