//! Escalation chain topology and transitions.
//!
//! ```text
//! MAIN -> RETRY_1 -> ... -> RETRY_N -> DEAD_LETTER
//!   \________\_______________\______-> INVALID
//! ```
//!
//! A Retryable failure advances one hop; from `RETRY_N` (or from `MAIN` when
//! N is zero) it lands on the dead-letter topic. A NonRetryable failure goes
//! to the invalid topic from any consumed state. `DEAD_LETTER` and `INVALID`
//! are terminal and never consumed by this service.

use std::fmt;

use crate::config::ProcessorConfig;
use crate::processing::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainState {
    Main,
    /// k-th retry topic, 1-based
    Retry(u32),
    DeadLetter,
    Invalid,
}

impl ChainState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChainState::DeadLetter | ChainState::Invalid)
    }

    /// Number of earlier failed deliveries implied by this state
    pub fn previous_attempts(&self) -> u32 {
        match self {
            ChainState::Main => 0,
            ChainState::Retry(k) => *k,
            ChainState::DeadLetter | ChainState::Invalid => 0,
        }
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainState::Main => f.write_str("main"),
            ChainState::Retry(k) => write!(f, "retry-{k}"),
            ChainState::DeadLetter => f.write_str("dead-letter"),
            ChainState::Invalid => f.write_str("invalid"),
        }
    }
}

/// Where a record that failed in `state` with `kind` goes next.
///
/// `None` for terminal states, which are never consumed.
pub fn next_hop(state: ChainState, kind: FailureKind, max_attempts: u32) -> Option<ChainState> {
    if state.is_terminal() {
        return None;
    }
    if kind == FailureKind::NonRetryable {
        return Some(ChainState::Invalid);
    }

    let next_attempt = state.previous_attempts() + 1;
    if next_attempt <= max_attempts {
        Some(ChainState::Retry(next_attempt))
    } else {
        Some(ChainState::DeadLetter)
    }
}

/// Physical topic names for every chain state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTopology {
    main: String,
    retry_topics: Vec<String>,
    dead_letter: String,
    invalid: String,
}

impl ChainTopology {
    pub fn from_config(config: &ProcessorConfig) -> Self {
        let topics = &config.topics;
        Self {
            main: topics.item_ordered_certified_copy.clone(),
            retry_topics: topics.retry_topics(config.retry.max_attempts),
            dead_letter: topics.dead_letter_topic(),
            invalid: topics.invalid_item_ordered_certified_copy.clone(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_topics.len() as u32
    }

    /// Chain state a consumed topic corresponds to
    pub fn state_of(&self, topic: &str) -> Option<ChainState> {
        if topic == self.main {
            return Some(ChainState::Main);
        }
        if topic == self.dead_letter {
            return Some(ChainState::DeadLetter);
        }
        if topic == self.invalid {
            return Some(ChainState::Invalid);
        }
        self.retry_topics
            .iter()
            .position(|t| t == topic)
            .map(|index| ChainState::Retry(index as u32 + 1))
    }

    /// Topic for `state`; a retry index beyond the chain maps to the dead-letter topic
    pub fn topic_for(&self, state: ChainState) -> &str {
        match state {
            ChainState::Main => &self.main,
            ChainState::Retry(k) => k
                .checked_sub(1)
                .and_then(|index| self.retry_topics.get(index as usize))
                .map(String::as_str)
                .unwrap_or(self.dead_letter.as_str()),
            ChainState::DeadLetter => &self.dead_letter,
            ChainState::Invalid => &self.invalid,
        }
    }

    pub fn invalid_topic(&self) -> &str {
        &self.invalid
    }

    /// Main topic followed by every retry topic
    pub fn consumed_topics(&self) -> Vec<String> {
        let mut topics = Vec::with_capacity(self.retry_topics.len() + 1);
        topics.push(self.main.clone());
        topics.extend(self.retry_topics.iter().cloned());
        topics
    }
}
