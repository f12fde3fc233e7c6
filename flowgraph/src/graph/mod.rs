//! State graph: nodes, unconditional and conditional edges, compile and run.
//!
//! Build a [`StateGraph`], compile it into a [`CompiledStateGraph`], then
//! `invoke` / `stream` it with a state. With a checkpointer, runs are
//! checkpointed per node and can be suspended by a node and resumed later.

mod compile_error;
mod compiled;
mod conditional;
mod fn_node;
mod interrupt;
mod logging;
mod logging_middleware;
mod node;
mod node_middleware;
mod retry_guard;
mod run_context;
mod state_graph;

pub use compile_error::{BuildIssue, CompilationError};
pub use compiled::{CompiledStateGraph, RunOutcome};
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use fn_node::FnNode;
pub use interrupt::{Interrupt, PendingInterrupt};
pub use logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_state_update,
};
pub use logging_middleware::LoggingNodeMiddleware;
pub use node::{Node, NodeOutcome, Suspension};
pub use node_middleware::{NodeCall, NodeFuture, NodeMiddleware};
pub use retry_guard::{RetryDecision, RetryGuard};
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
