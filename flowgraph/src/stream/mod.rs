//! Streaming types for graph runs.
//!
//! Defines stream modes and events for value, update, checkpoint and custom
//! streaming. Used by `CompiledStateGraph::stream` / `stream_resume` and by nodes
//! that emit incremental results through `RunContext::emit_custom`.

use serde_json::Value;
use std::fmt::Debug;

use crate::graph::Interrupt;

/// Stream mode selector: which kinds of events to emit.
///
/// `Interrupt` and `Error` events are not selectable; they are always sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node completes.
    Values,
    /// Emit incremental updates with node id and state.
    Updates,
    /// Emit one event per checkpoint written.
    Checkpoints,
    /// Emit custom JSON payloads from nodes.
    Custom,
}

/// A checkpoint was written for the run's thread.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckpointEvent {
    pub checkpoint_id: String,
    pub step: u64,
    pub node_id: String,
    pub thread_id: String,
}

/// The run aborted. `node_id` is set when a node (not the engine) failed.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamError {
    pub node_id: Option<String>,
    pub message: String,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// Incremental update with the node id and state after that node.
    Updates { node_id: String, state: S },
    Checkpoint(CheckpointEvent),
    /// Custom JSON payload for arbitrary streaming data.
    Custom(Value),
    /// The run suspended; the stream ends after this event.
    Interrupt(Interrupt),
    /// The run failed; the stream ends after this event.
    Error(StreamError),
}

impl<S> StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// True for the events that end a stream early.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Interrupt(_) | StreamEvent::Error(_))
    }
}
