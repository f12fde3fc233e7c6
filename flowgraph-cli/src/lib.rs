//! flowgraph-cli library: the workflows behind the `flowgraph` binary.
//!
//! Reads OpenAI and storage config from `.env`, builds the code-assist, chat and
//! support graphs and runs them. Every run function takes the `LlmClient` to use,
//! so callers (and tests) can substitute `MockLlm`.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let config = flowgraph_cli::RunConfig::from_env()?;
//! let llm = flowgraph_cli::build_llm(&config, vec![])?;
//! let out = flowgraph_cli::run_chat(&config, llm, "thread-1", "hello").await?;
//! ```

mod config;
pub mod graphs;
mod logging;
mod middleware;
mod run;

pub use config::{Error, RunConfig, RunOptions};
pub use flowgraph::{Message, MessagesState, RunOutcome};
pub use graphs::CodeAssistState;
pub use logging::{default_filter, init_tracing};
pub use middleware::WithNodeLogging;
#[cfg(feature = "openai")]
pub use run::build_llm;
pub use run::{
    open_checkpointer, resume_support, run_chat, run_code_assist, run_support, thread_history,
    ThreadHistory,
};

#[cfg(test)]
mod tests;
