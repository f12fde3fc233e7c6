//! Graph node trait: one step in a StateGraph.
//!
//! Receives state `S`, returns the node's output as a [`NodeOutcome`]: either the
//! new state (full replacement or a patch the graph's `StateUpdater` merges) or a
//! suspension asking the caller for input. Routing is not the node's job; edges
//! declared on the `StateGraph` pick the successor.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::AgentError;

use super::RunContext;

/// Node asks the caller for external input.
///
/// `pending` is whatever the node has produced so far (e.g. the assistant
/// message that requested a human tool). It is persisted and handed back to
/// [`Node::resume`], so work done before the interrupt is never repeated.
#[derive(Debug, Clone)]
pub struct Suspension<S> {
    pub pending: S,
    pub payload: Value,
}

/// Result of one node step.
#[derive(Debug, Clone)]
pub enum NodeOutcome<S> {
    /// Node finished; the value is merged into the graph state.
    Completed(S),
    /// Node paused; the run stops and reports an interrupt.
    Suspended(Suspension<S>),
}

impl<S> NodeOutcome<S> {
    pub fn suspend(pending: S, payload: Value) -> Self {
        NodeOutcome::Suspended(Suspension { pending, payload })
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, NodeOutcome::Suspended(_))
    }
}

impl<S> From<S> for NodeOutcome<S> {
    fn from(state: S) -> Self {
        NodeOutcome::Completed(state)
    }
}

/// One step in a graph: state in, outcome out.
///
/// **Interaction**: Registered with `StateGraph::add_node`; called by
/// `CompiledStateGraph::invoke` / `stream` (via `run_with_context`) and by
/// `CompiledStateGraph::resume` (via `resume`).
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"chat"`, `"tools"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step. The node receives a fresh copy of the current state.
    async fn run(&self, state: S) -> Result<NodeOutcome<S>, AgentError>;

    /// Optional variant with run context (streaming, config).
    ///
    /// Default implementation calls `run` and ignores the context.
    async fn run_with_context(
        &self,
        state: S,
        _ctx: &RunContext<S>,
    ) -> Result<NodeOutcome<S>, AgentError> {
        self.run(state).await
    }

    /// Continues a suspended step with the caller's resume data.
    ///
    /// `state` is the graph state the node was originally given, `pending` is
    /// what it returned in `Suspension::pending`. `value` stands in for the
    /// result of the interrupt point. Nodes that never suspend keep the default.
    async fn resume(
        &self,
        _state: S,
        _pending: S,
        _value: Value,
    ) -> Result<NodeOutcome<S>, AgentError> {
        Err(AgentError::ResumeUnsupported(self.id().to_string()))
    }
}
