//! Tool capability: named tools invoked with JSON arguments.
//!
//! The engine never calls tools itself; `ToolNode` dispatches the assistant's
//! tool calls through a [`ToolSource`]. Tool specs are also handed to the
//! generation capability so the model can pick tools and fill in arguments.

mod fn_source;
mod mock;

pub use fn_source::FnToolSource;
pub use mock::MockToolSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool description passed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema of the arguments object.
    pub input_schema: Value,
}

/// Text result of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

impl From<String> for ToolCallContent {
    fn from(text: String) -> Self {
        Self { text }
    }
}

#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Arguments did not match the tool's schema.
    #[error("invalid tool input: {0}")]
    InvalidInput(String),

    /// The tool backend failed (network, process, remote error).
    #[error("tool transport error: {0}")]
    Transport(String),
}

/// Lists tools and executes them by name.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<ToolCallContent, ToolSourceError>;
}
