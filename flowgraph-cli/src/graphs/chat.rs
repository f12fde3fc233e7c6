//! Checkpointed conversation: `START → chat_node → END` over `MessagesState`.
//!
//! Every turn appends to the thread's history, so a later run on the same
//! thread sees the earlier messages.

use std::sync::Arc;

use flowgraph::{ChatNode, GenerateOptions, LlmClient, MessagesState, StateGraph, END, START};

pub const CHAT_NODE: &str = "chat_node";

pub fn build_graph(llm: Arc<dyn LlmClient>, options: GenerateOptions) -> StateGraph<MessagesState> {
    let mut graph = StateGraph::<MessagesState>::new();
    graph.with_state_updater(MessagesState::updater());
    graph.add_node(
        CHAT_NODE,
        Arc::new(ChatNode::new(CHAT_NODE, llm).with_options(options)),
    );
    graph.add_edge(START, CHAT_NODE).add_edge(CHAT_NODE, END);
    graph
}
