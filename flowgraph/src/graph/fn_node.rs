//! Closure-backed node.

use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{Node, NodeOutcome};

/// Adapts an async closure `Fn(S) -> Future<Output = Result<S, AgentError>>` into a
/// [`Node`]. The closure never suspends.
///
/// ```rust,ignore
/// graph.add_node("increment_retry_count", Arc::new(FnNode::new("increment_retry_count", |mut s: CodeState| async move {
///     s.retry_count += 1;
///     Ok(s)
/// })));
/// ```
pub struct FnNode<S, F> {
    id: String,
    f: F,
    _state: PhantomData<fn() -> S>,
}

impl<S, F> FnNode<S, F> {
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self {
            id: id.into(),
            f,
            _state: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F, Fut> Node<S> for FnNode<S, F>
where
    S: Clone + Send + Sync + Debug + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, AgentError>> + Send,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: S) -> Result<NodeOutcome<S>, AgentError> {
        (self.f)(state).await.map(NodeOutcome::Completed)
    }
}
