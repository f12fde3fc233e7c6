//! Prebuilt nodes for conversational graphs over [`MessagesState`].
//!
//! `chat → tools_condition → tools → chat` is the usual wiring:
//!
//! ```rust,ignore
//! let mut graph = StateGraph::<MessagesState>::new();
//! graph.with_state_updater(MessagesState::updater());
//! graph.add_node("chat_node", Arc::new(ChatNode::new("chat_node", llm)));
//! graph.add_node(TOOLS_NODE, Arc::new(ToolNode::new(tools).with_human_tool(spec)));
//! graph.add_edge(START, "chat_node");
//! graph.add_conditional_edges("chat_node", tools_condition, [TOOLS_NODE, END]);
//! graph.add_edge(TOOLS_NODE, "chat_node");
//! ```

mod chat_node;
mod state;
mod tool_node;

pub use chat_node::ChatNode;
pub use state::MessagesState;
pub use tool_node::{tools_condition, ToolNode, TOOLS_NODE};
