//! Checkpointed thread commands: chat, support, resume, history.
//!
//! All of them open the same checkpointer (`config.db_path`), so a thread
//! started by `support` can be resumed by an operator from another process.

use std::sync::Arc;

use flowgraph::{
    Checkpoint, Checkpointer, CompiledStateGraph, Interrupt, LlmClient, Message, MessagesState,
    RunOutcome, RunnableConfig, StateGraph,
};
use serde_json::json;

use crate::config::RunConfig;
use crate::graphs::{chat, support};
use crate::middleware::WithNodeLogging;

use super::{generate_options, open_checkpointer, Error};

/// Checkpoints of one thread, oldest first, and the request it is waiting on.
#[derive(Debug, Clone)]
pub struct ThreadHistory {
    pub checkpoints: Vec<Checkpoint<MessagesState>>,
    pub pending: Option<Interrupt>,
}

fn compile(
    config: &RunConfig,
    mut graph: StateGraph<MessagesState>,
) -> Result<CompiledStateGraph<MessagesState>, Error> {
    graph.with_node_logging(config.verbose);
    if let Some(ttl) = config.interrupt_ttl {
        graph.with_interrupt_ttl(ttl);
    }
    Ok(graph.compile_with_checkpointer(open_checkpointer(config)?)?)
}

/// Latest state of the thread plus the new user message.
async fn next_turn(
    compiled: &CompiledStateGraph<MessagesState>,
    thread: &RunnableConfig,
    message: &str,
) -> Result<MessagesState, Error> {
    let mut state = compiled.get_state(thread).await?.unwrap_or_default();
    state.messages.push(Message::user(message));
    Ok(state)
}

/// One chat turn on `thread_id`; earlier turns of the thread are part of the prompt.
pub async fn run_chat(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
    thread_id: &str,
    message: &str,
) -> Result<RunOutcome<MessagesState>, Error> {
    let compiled = compile(config, chat::build_graph(llm, generate_options(config)))?;
    let thread = RunnableConfig::for_thread(thread_id);
    let state = next_turn(&compiled, &thread, message).await?;
    Ok(compiled.invoke(state, Some(thread)).await?)
}

/// One support turn; ends `Interrupted` when the model asked for a human.
pub async fn run_support(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
    thread_id: &str,
    message: &str,
) -> Result<RunOutcome<MessagesState>, Error> {
    let compiled = compile(config, support::build_graph(llm, generate_options(config)))?;
    let thread = RunnableConfig::for_thread(thread_id);
    let state = next_turn(&compiled, &thread, message).await?;
    Ok(compiled.invoke(state, Some(thread)).await?)
}

/// Answers the thread's outstanding human_assistance call with `solution`.
pub async fn resume_support(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
    thread_id: &str,
    solution: &str,
) -> Result<RunOutcome<MessagesState>, Error> {
    let compiled = compile(config, support::build_graph(llm, generate_options(config)))?;
    let thread = RunnableConfig::for_thread(thread_id);
    if let Some(pending) = compiled.pending_interrupt(&thread).await? {
        tracing::info!(
            thread_id,
            node_id = %pending.node_id,
            query = %pending.value,
            "resuming with operator answer"
        );
    }
    Ok(compiled
        .resume(thread, json!({ "data": solution }))
        .await?)
}

/// Reads a thread without running anything; needs no model.
pub async fn thread_history(config: &RunConfig, thread_id: &str) -> Result<ThreadHistory, Error> {
    let checkpointer: Arc<dyn Checkpointer<MessagesState>> = open_checkpointer(config)?;
    let thread = RunnableConfig::for_thread(thread_id);
    Ok(ThreadHistory {
        checkpoints: checkpointer.history(&thread).await?,
        pending: checkpointer
            .get_interrupt(&thread)
            .await?
            .map(|p| p.interrupt),
    })
}
