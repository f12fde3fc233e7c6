//! Tool source backed by async closures.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

type ToolFuture = Pin<Box<dyn Future<Output = Result<String, ToolSourceError>> + Send>>;
type ToolFn = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// Named tools implemented as closures `Fn(Value) -> Future<Result<String, ToolSourceError>>`.
///
/// ```rust,ignore
/// let tools = FnToolSource::new().tool(spec, |args| async move {
///     let city = args["city"].as_str().unwrap_or_default().to_string();
///     Ok(format!("sunny in {}", city))
/// });
/// ```
#[derive(Default, Clone)]
pub struct FnToolSource {
    tools: BTreeMap<String, (ToolSpec, ToolFn)>,
}

impl FnToolSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; a later registration with the same name replaces it.
    pub fn tool<F, Fut>(mut self, spec: ToolSpec, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolSourceError>> + Send + 'static,
    {
        let call: ToolFn = Arc::new(move |args: Value| -> ToolFuture { Box::pin(f(args)) });
        self.tools.insert(spec.name.clone(), (spec, call));
        self
    }
}

#[async_trait]
impl ToolSource for FnToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.values().map(|(spec, _)| spec.clone()).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        let (_, call) = self
            .tools
            .get(name)
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?;
        call(arguments).await.map(ToolCallContent::from)
    }
}
