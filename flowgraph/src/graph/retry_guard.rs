//! Bounded retry loops.
//!
//! The engine never retries a node. A graph that wants "generate, validate, retry
//! until good enough" keeps a counter in its state and routes on it; [`RetryGuard`]
//! encodes the routing rule so every graph applies the same precedence.

use super::END;

/// Outcome of a retry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Quality below threshold and retries left.
    Retry,
    /// Quality meets the threshold.
    Accept,
    /// Retries used up; the last output stands even if below threshold.
    Exhausted,
}

/// Quality threshold plus retry cap.
///
/// `retries >= max_retries` always stops the loop, whatever the quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryGuard {
    pub threshold: f64,
    pub max_retries: u32,
}

impl RetryGuard {
    pub fn new(threshold: f64, max_retries: u32) -> Self {
        Self {
            threshold,
            max_retries,
        }
    }

    /// A missing quality score counts as below threshold.
    pub fn decide(&self, quality: Option<f64>, retries: u32) -> RetryDecision {
        if retries >= self.max_retries {
            return RetryDecision::Exhausted;
        }
        match quality {
            Some(q) if q >= self.threshold => RetryDecision::Accept,
            _ => RetryDecision::Retry,
        }
    }

    pub fn should_retry(&self, quality: Option<f64>, retries: u32) -> bool {
        self.decide(quality, retries) == RetryDecision::Retry
    }

    /// `retry_node` when another attempt is due, otherwise `END`.
    pub fn route<'a>(&self, quality: Option<f64>, retries: u32, retry_node: &'a str) -> &'a str {
        if self.should_retry(quality, retries) {
            retry_node
        } else {
            END
        }
    }
}
