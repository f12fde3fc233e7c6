//! Tool node: executes the tool calls of the last assistant message.
//!
//! Calls are dispatched by name through a `ToolSource`. Tools registered with
//! `with_human_tool` are answered by a person: the node suspends the run with
//! the call's arguments as payload, and on resume takes `data` from the resume
//! value as the tool result. Tool errors propagate and fail the node.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::graph::{Node, NodeOutcome, END};
use crate::message::{Message, ToolCall};
use crate::tool_source::{ToolSource, ToolSourceError, ToolSpec};

use super::MessagesState;

/// Conventional id of the tool node; `tools_condition` routes here.
pub const TOOLS_NODE: &str = "tools";

/// Routes to `"tools"` when the last message is an assistant message with tool calls, else `END`.
pub fn tools_condition(state: &MessagesState) -> String {
    match state.last_message() {
        Some(m) if !m.tool_calls().is_empty() => TOOLS_NODE.to_string(),
        _ => END.to_string(),
    }
}

/// Tool calls of the last assistant message that have no tool message yet.
fn unanswered_calls<'a>(messages: impl Iterator<Item = &'a Message>) -> Vec<ToolCall> {
    let mut calls: &[ToolCall] = &[];
    let mut answered = 0;
    for m in messages {
        match m {
            Message::Assistant { tool_calls, .. } => {
                calls = tool_calls.as_slice();
                answered = 0;
            }
            Message::Tool { .. } => answered += 1,
            _ => {}
        }
    }
    calls.iter().skip(answered).cloned().collect()
}

fn parse_arguments(call: &ToolCall) -> Result<Value, AgentError> {
    if call.arguments.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&call.arguments).map_err(|e| {
        ToolSourceError::InvalidInput(format!("arguments of `{}`: {}", call.name, e)).into()
    })
}

/// Tool result text from a resume value: `data` when present, else the whole value.
fn resume_text(value: &Value) -> String {
    let data = value.get("data").unwrap_or(value);
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Executes pending tool calls and returns the tool messages as a patch.
/// Pair with `MessagesState::updater()`.
pub struct ToolNode {
    id: String,
    source: Arc<dyn ToolSource>,
    human_tools: Vec<ToolSpec>,
}

impl ToolNode {
    pub fn new(source: Arc<dyn ToolSource>) -> Self {
        Self {
            id: TOOLS_NODE.to_string(),
            source,
            human_tools: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Registers a tool answered by a person through interrupt/resume.
    pub fn with_human_tool(mut self, spec: ToolSpec) -> Self {
        self.human_tools.push(spec);
        self
    }

    /// Specs of every tool this node can run, for binding to the LLM.
    pub async fn specs(&self) -> Result<Vec<ToolSpec>, AgentError> {
        let mut specs = self.source.list_tools().await?;
        specs.extend(self.human_tools.iter().cloned());
        Ok(specs)
    }

    fn is_human(&self, name: &str) -> bool {
        self.human_tools.iter().any(|t| t.name == name)
    }

    /// Answers the pending calls in order. `produced` holds tool messages already
    /// written in this step; `resume` answers the first pending human call.
    async fn dispatch(
        &self,
        history: &[Message],
        mut produced: Vec<Message>,
        mut resume: Option<Value>,
    ) -> Result<NodeOutcome<MessagesState>, AgentError> {
        let calls = unanswered_calls(history.iter().chain(produced.iter()));
        for call in calls {
            let call_id = call.id.clone().unwrap_or_else(|| call.name.clone());
            if self.is_human(&call.name) {
                let Some(value) = resume.take() else {
                    tracing::info!(node_id = %self.id, tool = %call.name, "waiting for human input");
                    return Ok(NodeOutcome::suspend(
                        MessagesState { messages: produced },
                        parse_arguments(&call)?,
                    ));
                };
                produced.push(Message::tool(call_id, &call.name, resume_text(&value)));
                continue;
            }
            let args = parse_arguments(&call)?;
            tracing::debug!(node_id = %self.id, tool = %call.name, "calling tool");
            let out = self.source.call_tool(&call.name, args).await?;
            produced.push(Message::tool(call_id, &call.name, out.text));
        }
        if resume.is_some() {
            return Err(AgentError::ExecutionFailed(
                "resume data given but no human tool call is waiting".into(),
            ));
        }
        Ok(NodeOutcome::Completed(MessagesState { messages: produced }))
    }
}

#[async_trait]
impl Node<MessagesState> for ToolNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: MessagesState) -> Result<NodeOutcome<MessagesState>, AgentError> {
        self.dispatch(&state.messages, Vec::new(), None).await
    }

    async fn resume(
        &self,
        state: MessagesState,
        pending: MessagesState,
        value: Value,
    ) -> Result<NodeOutcome<MessagesState>, AgentError> {
        self.dispatch(&state.messages, pending.messages, Some(value))
            .await
    }
}
