//! Mock ToolSource for tests.
//!
//! Returns a fixed tool list and configured results; records every call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Mock tool source: fixed tool list and per-tool results.
///
/// `call_tool(name, _)` returns the result registered for `name`, falling back
/// to the default result. Unknown names (not in the tool list) are `NotFound`.
pub struct MockToolSource {
    tools: Vec<ToolSpec>,
    results: HashMap<String, String>,
    default_result: String,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolSource {
    /// Creates a mock with custom tool list and fixed call result.
    pub fn new(tools: Vec<ToolSpec>, call_result: impl Into<String>) -> Self {
        Self {
            tools,
            results: HashMap::new(),
            default_result: call_result.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A mock that lists one tool `get_weather` (takes `city`) and returns a fixed forecast.
    pub fn weather_example() -> Self {
        Self::new(
            vec![ToolSpec {
                name: "get_weather".to_string(),
                description: Some("Current weather for a city.".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }),
            }],
            "sunny, 22C",
        )
    }

    /// Result for one tool name (builder style).
    pub fn with_result(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.results.insert(name.into(), text.into());
        self
    }

    /// `(name, arguments)` of every call so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(ToolSourceError::NotFound(name.to_string()));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((name.to_string(), arguments));
        }
        let text = self
            .results
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default_result.clone());
        Ok(ToolCallContent { text })
    }
}
