//! Node middleware: wraps each node call in the run loop.
//!
//! Set with `StateGraph::with_middleware`. The middleware receives the node id,
//! the state going in and a boxed `inner` call it must await to run the node.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::AgentError;

use super::NodeOutcome;

/// Future returned by a wrapped node call.
pub type NodeFuture<S> = Pin<Box<dyn Future<Output = Result<NodeOutcome<S>, AgentError>> + Send>>;

/// The wrapped node call handed to [`NodeMiddleware::around_run`].
pub type NodeCall<S> = Box<dyn FnOnce(S) -> NodeFuture<S> + Send>;

/// Around-style hook for node execution (logging, timing, state inspection).
#[async_trait]
pub trait NodeMiddleware<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeCall<S>,
    ) -> Result<NodeOutcome<S>, AgentError>;
}
