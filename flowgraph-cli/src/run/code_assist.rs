//! Runs the code-assist graph, streaming per-node updates to a callback.

use std::sync::Arc;

use flowgraph::{LlmClient, StreamEvent, StreamMode};
use tokio_stream::StreamExt;

use crate::config::RunConfig;
use crate::graphs::code_assist::{self, CodeAssistState};
use crate::middleware::WithNodeLogging;

use super::Error;

/// Runs one query and returns the final state. `on_node` sees every node as it
/// finishes (node id, state after it).
pub async fn run_code_assist<F>(
    config: &RunConfig,
    llm: Arc<dyn LlmClient>,
    query: &str,
    mut on_node: F,
) -> Result<CodeAssistState, Error>
where
    F: FnMut(&str, &CodeAssistState),
{
    let mut graph = code_assist::build_graph(llm);
    graph.with_node_logging(config.verbose);
    let compiled = graph.compile()?;

    let mut stream = compiled.stream(CodeAssistState::new(query), None, [StreamMode::Updates]);
    let mut last = None;
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Updates { node_id, state } => {
                on_node(&node_id, &state);
                last = Some(state);
            }
            StreamEvent::Error(e) => return Err(e.message.into()),
            _ => {}
        }
    }
    last.ok_or_else(|| "code-assist run ended without output".into())
}
