//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for runs, node steps and state merges.

use crate::error::AgentError;

/// Log graph execution start.
pub fn log_graph_start(thread_id: Option<&str>, entry: &str) {
    tracing::info!(thread_id = thread_id.unwrap_or("-"), entry, "Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(thread_id: Option<&str>, steps: u64) {
    tracing::info!(thread_id = thread_id.unwrap_or("-"), steps, "Graph execution complete");
}

/// Log graph execution error.
pub fn log_graph_error(error: &AgentError) {
    tracing::error!(node_id = error.node_id(), %error, "Graph execution error");
}

/// Log node execution start.
pub fn log_node_start(node_id: &str, step: u64) {
    tracing::debug!(node_id, step, "Starting node execution");
}

/// Log node execution completion and the chosen successor.
pub fn log_node_complete(node_id: &str, step: u64, next: &str) {
    tracing::debug!(node_id, step, next, "Node execution complete");
}

/// Log state update after the node output was merged.
pub fn log_state_update(node_id: &str, updater: &str) {
    tracing::trace!(node_id, updater, "State updated");
}
