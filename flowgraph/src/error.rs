//! Run-time error types.
//!
//! Returned by `Node::run`, `CompiledStateGraph::invoke` / `resume` and the
//! capability traits (`LlmClient`, `ToolSource`). Graph construction errors
//! live in [`CompilationError`](crate::graph::CompilationError).

use thiserror::Error;

use crate::memory::CheckpointError;
use crate::tool_source::ToolSourceError;

/// Error raised while a graph runs.
///
/// Node authors usually return `ExecutionFailed`, `Provider` or `Tool`. The engine
/// wraps any node failure in `NodeFailed` so callers always see which node broke.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. bad input, validation failure).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The generation capability failed (transport, auth, malformed response).
    #[error("provider error: {0}")]
    Provider(String),

    /// A tool invocation failed.
    #[error("tool error: {0}")]
    Tool(#[from] ToolSourceError),

    /// A node failed; the run aborted at the last checkpoint.
    #[error("node `{node_id}` failed: {source}")]
    NodeFailed {
        node_id: String,
        #[source]
        source: Box<AgentError>,
    },

    /// A conditional router returned a target outside its declared candidates.
    #[error("router on `{from}` returned undeclared target `{target}`")]
    Routing { from: String, target: String },

    /// Checkpoint store failure.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Interrupt or resume needs both a checkpointer and `config.thread_id`.
    #[error("interrupts require a checkpointer and a thread_id")]
    SessionRequired,

    /// A new run was started on a session that is waiting for resume data.
    #[error("thread `{0}` has an outstanding interrupt; resume it first")]
    InterruptPending(String),

    /// Resume was called but nothing is waiting on the session.
    #[error("no pending interrupt for thread `{0}`")]
    NoPendingInterrupt(String),

    /// The outstanding interrupt outlived the configured TTL and was dropped.
    #[error("interrupt for thread `{0}` expired")]
    InterruptExpired(String),

    /// The paused node does not implement `Node::resume`.
    #[error("node `{0}` cannot be resumed")]
    ResumeUnsupported(String),
}

impl AgentError {
    /// Node id when this is a `NodeFailed` error.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            AgentError::NodeFailed { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// Innermost cause, skipping `NodeFailed` wrappers.
    pub fn root_cause(&self) -> &AgentError {
        match self {
            AgentError::NodeFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
