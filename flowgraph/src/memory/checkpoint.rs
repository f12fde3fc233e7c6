//! Checkpoint and metadata types.
//!
//! A checkpoint is one state snapshot taken after a node ran. Checkpoints of a
//! thread are totally ordered by `metadata.seq`, which the store assigns on `put`.

use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// Metadata for a single checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Node executions completed in the run that wrote this checkpoint (0-based).
    pub step: u64,
    /// Position in the thread's checkpoint sequence. Assigned by the store.
    pub seq: u64,
    /// Node whose output this checkpoint holds.
    pub node_id: Option<String>,
    pub created_at: Option<SystemTime>,
}

/// What produced the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointSource {
    /// A node completed during a normal walk.
    Loop,
    /// A paused node completed after `resume`.
    Resume,
}

impl CheckpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Loop => "loop",
            CheckpointSource::Resume => "resume",
        }
    }
}

impl FromStr for CheckpointSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loop" => Ok(Self::Loop),
            "resume" => Ok(Self::Resume),
            other => Err(format!("unknown checkpoint source: {}", other)),
        }
    }
}

/// One checkpoint: state snapshot + id/ts + metadata.
///
/// **Interaction**: Produced by `CompiledStateGraph` after every node; consumed by
/// `Checkpointer::put`, returned by `get_tuple` and `history`.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub id: String,
    pub ts: String,
    pub channel_values: S,
    pub metadata: CheckpointMetadata,
}

/// Item returned by `Checkpointer::list` for history views.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint for the state a node just produced. `seq` is left at 0
    /// and filled in by the store.
    pub fn from_state(
        state: S,
        source: CheckpointSource,
        step: u64,
        node_id: impl Into<String>,
    ) -> Self {
        let now = SystemTime::now();
        let millis = system_time_to_millis(now);
        Self {
            id: format!("{}-{}", millis, step),
            ts: millis.to_string(),
            channel_values: state,
            metadata: CheckpointMetadata {
                source,
                step,
                seq: 0,
                node_id: Some(node_id.into()),
                created_at: Some(now),
            },
        }
    }
}

/// Milliseconds since the Unix epoch; 0 for times before it.
pub(crate) fn system_time_to_millis(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
pub(crate) fn millis_to_system_time(millis: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_millis(millis)
}
