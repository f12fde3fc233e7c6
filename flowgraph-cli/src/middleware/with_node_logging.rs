//! Extension trait that attaches node logging to a graph before it is compiled.
//!
//! Extends [`StateGraph`](flowgraph::StateGraph) from outside the library with
//! [`LoggingNodeMiddleware`](flowgraph::LoggingNodeMiddleware).

use std::fmt::Debug;
use std::sync::Arc;

use flowgraph::{LoggingNodeMiddleware, StateGraph};

/// Attach `LoggingNodeMiddleware` to a graph.
pub trait WithNodeLogging {
    /// `log_state` additionally logs the state entering each node at trace level.
    fn with_node_logging(&mut self, log_state: bool) -> &mut Self;
}

impl<S> WithNodeLogging for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn with_node_logging(&mut self, log_state: bool) -> &mut Self {
        self.with_middleware(Arc::new(
            LoggingNodeMiddleware::<S>::new().with_state(log_state),
        ))
    }
}
