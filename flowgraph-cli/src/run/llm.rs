//! OpenAI client from the run config (feature `openai`).

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use flowgraph::{ChatOpenAI, LlmClient, ToolSpec};

use crate::config::RunConfig;

use super::Error;

/// Builds a `ChatOpenAI` for `config`, with `tools` bound when non-empty.
pub fn build_llm(config: &RunConfig, tools: Vec<ToolSpec>) -> Result<Arc<dyn LlmClient>, Error> {
    let openai_config = OpenAIConfig::new()
        .with_api_base(&config.api_base)
        .with_api_key(config.require_api_key()?);
    let mut llm = ChatOpenAI::with_config(openai_config, config.model.clone());
    if let Some(t) = config.temperature {
        llm = llm.with_temperature(t);
    }
    if let Some(n) = config.max_tokens {
        llm = llm.with_max_output_tokens(n);
    }
    if !tools.is_empty() {
        llm = llm.with_tools(tools);
    }
    Ok(Arc::new(llm))
}
