//! Interrupt records.
//!
//! A node suspends by returning `NodeOutcome::Suspended`; the engine turns that
//! into an [`Interrupt`] (what the caller sees) and a [`PendingInterrupt`] (what
//! the checkpointer stores so `resume` can re-enter the node).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde_json::Value;

static INTERRUPT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Request for external input raised by a paused node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interrupt {
    pub id: String,
    /// Node that suspended.
    pub node_id: String,
    /// Describes the input the node needs, e.g. `{"query": "..."}`.
    pub value: Value,
    #[serde(skip)]
    pub created_at: SystemTime,
}

impl Interrupt {
    pub fn new(node_id: impl Into<String>, value: Value) -> Self {
        let created_at = SystemTime::now();
        let millis = created_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = INTERRUPT_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("intr-{}-{}", millis, seq),
            node_id: node_id.into(),
            value,
            created_at,
        }
    }

    /// Age relative to `now`; zero if the clock went backwards.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or_default()
    }

    /// True when a TTL is set and the interrupt is older than it.
    pub fn is_expired(&self, ttl: Option<Duration>, now: SystemTime) -> bool {
        ttl.map(|ttl| self.age(now) > ttl).unwrap_or(false)
    }
}

/// Outstanding interrupt as persisted per thread.
///
/// `state` is the graph state the paused node was given; `pending` is the node's
/// own progress up to the interrupt point. Both go back into `Node::resume`.
#[derive(Debug, Clone)]
pub struct PendingInterrupt<S> {
    pub interrupt: Interrupt,
    pub pending: S,
    pub state: S,
    /// Step counter of the paused node within its run.
    pub step: u64,
}
