//! Run entry points for the subcommands.
//!
//! Every entry point takes a ready [`RunConfig`](crate::RunConfig) and an
//! `LlmClient`, so tests can pass `MockLlm`; the binary builds the client with
//! [`build_llm`] (feature `openai`).

pub use crate::config::Error;

mod checkpointer;
mod code_assist;
#[cfg(feature = "openai")]
mod llm;
mod session;

pub use checkpointer::open_checkpointer;
pub use code_assist::run_code_assist;
#[cfg(feature = "openai")]
pub use llm::build_llm;
pub use session::{resume_support, run_chat, run_support, thread_history, ThreadHistory};

use flowgraph::GenerateOptions;

use crate::config::RunConfig;

/// Per-call generation options from the config.
pub(crate) fn generate_options(config: &RunConfig) -> GenerateOptions {
    GenerateOptions {
        model: None,
        max_output_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}
