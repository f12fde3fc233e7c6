//! # flowgraph
//!
//! Stateful workflow graphs in Rust. One state type flows through named nodes;
//! unconditional and conditional edges pick the next node; a checkpointer
//! snapshots the state after every node so a thread can be inspected, recovered
//! after a crash, or suspended by a node and resumed with external input.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `RetryGuard`. Build, validate and run graphs.
//! - [`channels`]: `StateUpdater`, `FieldReducers`. How node output merges into state.
//! - [`memory`]: `Checkpointer`, `MemorySaver`, `SqliteSaver` (feature `sqlite`).
//! - [`stream`]: `StreamMode`, `StreamEvent` for `CompiledStateGraph::stream`.
//! - [`llm`]: `LlmClient`, `MockLlm`, `ChatOpenAI` (feature `openai`).
//! - [`tool_source`]: `ToolSource`, `MockToolSource`, `FnToolSource`.
//! - [`prebuilt`]: `MessagesState`, `ChatNode`, `ToolNode`, `tools_condition`.
//!
//! ## Features
//!
//! - `sqlite` (default): durable checkpointer.
//! - `openai`: OpenAI-compatible chat client via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowgraph::{RetryGuard, RunOutcome, StateGraph, END, START};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Draft { quality: f64, retry_count: u32 }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let guard = RetryGuard::new(95.0, 3);
//! let mut graph = StateGraph::<Draft>::new();
//! graph.add_node_fn("generate", |s: Draft| async move { Ok(s) });
//! graph.add_node_fn("increment_retry_count", |mut s: Draft| async move {
//!     s.retry_count += 1;
//!     Ok(s)
//! });
//! graph.add_edge(START, "generate");
//! graph.add_conditional_edges(
//!     "generate",
//!     move |s: &Draft| guard.route(Some(s.quality), s.retry_count, "increment_retry_count").to_string(),
//!     ["increment_retry_count", END],
//! );
//! graph.add_edge("increment_retry_count", "generate");
//! let compiled = graph.compile()?;
//! let out = compiled.invoke(Draft::default(), None).await?;
//! assert_eq!(out.state().retry_count, 3);
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod prebuilt;
pub mod stream;
pub mod tool_source;

pub use channels::{BoxedStateUpdater, FieldMode, FieldReducers, ReplaceUpdater, StateUpdater};
pub use error::AgentError;
pub use graph::{
    BuildIssue, CompilationError, CompiledStateGraph, FnNode, Interrupt, LoggingNodeMiddleware,
    Node, NodeCall, NodeFuture, NodeMiddleware, NodeOutcome, RetryDecision, RetryGuard,
    RunContext, RunOutcome, StateGraph, Suspension, END, START,
};
pub use llm::{GenerateOptions, LlmClient, LlmResponse, MockLlm, ToolChoiceMode};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, JsonSerializer, MemorySaver, RunnableConfig, Serializer,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use message::{Message, ToolCall};
pub use prebuilt::{tools_condition, ChatNode, MessagesState, ToolNode, TOOLS_NODE};
pub use stream::{CheckpointEvent, StreamError, StreamEvent, StreamMode};
pub use tool_source::{
    FnToolSource, MockToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec,
};
