//! Support desk with a human in the loop.
//!
//! `chat_node` may call `human_assistance`; the tool node then suspends the run
//! with `{"query": ...}` until an operator resumes the thread with
//! `{"data": solution}`, which becomes the tool result.

use std::sync::Arc;

use flowgraph::{
    tools_condition, ChatNode, FnToolSource, GenerateOptions, LlmClient, MessagesState,
    StateGraph, ToolNode, ToolSpec, END, START, TOOLS_NODE,
};
use serde_json::json;

use super::chat::CHAT_NODE;

pub const HUMAN_ASSISTANCE: &str = "human_assistance";

const SUPPORT_PROMPT: &str = "You are a support assistant. When you cannot solve the user's \
problem yourself, call human_assistance with a short description of what you need.";

/// The tool the model calls to reach an operator.
pub fn human_assistance_spec() -> ToolSpec {
    ToolSpec {
        name: HUMAN_ASSISTANCE.to_string(),
        description: Some("Request assistance from a human operator.".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        }),
    }
}

/// Tools to bind to the model for this graph.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![human_assistance_spec()]
}

/// `llm` should already know [`tool_specs`].
pub fn build_graph(llm: Arc<dyn LlmClient>, options: GenerateOptions) -> StateGraph<MessagesState> {
    let tools = ToolNode::new(Arc::new(FnToolSource::new())).with_human_tool(human_assistance_spec());
    let mut graph = StateGraph::<MessagesState>::new();
    graph.with_state_updater(MessagesState::updater());
    graph.add_node(
        CHAT_NODE,
        Arc::new(
            ChatNode::new(CHAT_NODE, llm)
                .with_options(options)
                .with_system_prompt(SUPPORT_PROMPT),
        ),
    );
    graph.add_node(TOOLS_NODE, Arc::new(tools));
    graph.add_edge(START, CHAT_NODE);
    graph.add_conditional_edges(CHAT_NODE, tools_condition, [TOOLS_NODE, END]);
    graph.add_edge(TOOLS_NODE, CHAT_NODE);
    graph
}
