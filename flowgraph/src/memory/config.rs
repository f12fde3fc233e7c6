//! Invoke config: thread_id, checkpoint_id, checkpoint_ns.
//!
//! Passed to `CompiledStateGraph::invoke` / `resume` and to every `Checkpointer` call.

/// Config for a single run. Identifies the thread (session) and optional checkpoint.
///
/// Checkpointing and interrupts need `thread_id`; without it the graph runs
/// in-process only and nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Unique id for this conversation/session. Required when using a checkpointer.
    pub thread_id: Option<String>,
    /// If set, `get_tuple` loads this checkpoint instead of the latest.
    pub checkpoint_id: Option<String>,
    /// Optional namespace for checkpoints. Default is empty.
    pub checkpoint_ns: String,
}

impl RunnableConfig {
    /// Config for the given thread, latest checkpoint, default namespace.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Default::default()
        }
    }
}
