//! Middleware that logs node enter/exit with `tracing`.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::AgentError;

use super::{NodeCall, NodeMiddleware, NodeOutcome};

/// Logs every node call: id, elapsed time and whether it completed, suspended or failed.
/// With `with_state(true)` the state going in is logged at trace level.
pub struct LoggingNodeMiddleware<S> {
    log_state: bool,
    _state: PhantomData<fn() -> S>,
}

impl<S> Default for LoggingNodeMiddleware<S> {
    fn default() -> Self {
        Self {
            log_state: false,
            _state: PhantomData,
        }
    }
}

impl<S> LoggingNodeMiddleware<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, log_state: bool) -> Self {
        self.log_state = log_state;
        self
    }
}

#[async_trait]
impl<S> NodeMiddleware<S> for LoggingNodeMiddleware<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn around_run(
        &self,
        node_id: &str,
        state: S,
        inner: NodeCall<S>,
    ) -> Result<NodeOutcome<S>, AgentError> {
        if self.log_state {
            tracing::trace!(node_id, state = ?state, "node enter");
        } else {
            tracing::debug!(node_id, "node enter");
        }
        let started = Instant::now();
        let result = inner(state).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(NodeOutcome::Completed(_)) => {
                tracing::debug!(node_id, elapsed_ms, "node exit")
            }
            Ok(NodeOutcome::Suspended(s)) => {
                tracing::info!(node_id, elapsed_ms, payload = %s.payload, "node suspended")
            }
            Err(e) => tracing::warn!(node_id, elapsed_ms, error = %e, "node failed"),
        }
        result
    }
}
