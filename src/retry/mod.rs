//! # Retry Chain
//!
//! Topic-based retry with fixed backoff, a dead-letter topic for exhausted
//! retryable failures, and an invalid topic for everything permanent.

pub mod chain;
pub mod consumer;
pub mod routing;

pub use chain::{next_hop, ChainState, ChainTopology};
pub use consumer::{
    ChainConsumer, ChainConsumerStats, ChainConsumerStatsSnapshot, ChainHandler, ChainWorker,
    RecordOutcome,
};
pub use routing::{InvalidMessageRouter, MessageFlags};
