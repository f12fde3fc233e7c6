//! Code assistant: classify the query, answer it, and for coding questions
//! validate the answer and retry until it is accurate enough.
//!
//! ```text
//! START → classify_query ─┬─ general_chat_bot → END
//!                         └─ coding_chat_bot → coding_validate_chat_bot ─┬─ END
//!                               ↑                                         │
//!                               └──────── increment_retry_count ◄────────┘
//! ```

use std::sync::Arc;

use flowgraph::{
    AgentError, GenerateOptions, LlmClient, Message, RetryGuard, StateGraph, END, START,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const CLASSIFY_QUERY: &str = "classify_query";
pub const GENERAL_CHAT_BOT: &str = "general_chat_bot";
pub const CODING_CHAT_BOT: &str = "coding_chat_bot";
pub const CODING_VALIDATE_CHAT_BOT: &str = "coding_validate_chat_bot";
pub const INCREMENT_RETRY_COUNT: &str = "increment_retry_count";

/// Accuracy (percent) an answer needs to be accepted.
pub const ACCURACY_THRESHOLD: f64 = 95.0;
/// Extra coding attempts after the first one.
pub const MAX_RETRIES: u32 = 3;

const CLASSIFY_PROMPT: &str = "You are a classifier that determines if a user's query is related to coding. \
Answer with is_coding_question true for coding questions and false otherwise.";

const GENERAL_PROMPT: &str = "You are a helpful assistant.";

const CODING_PROMPT: &str = "You are a coding assistant that helps users with programming-related queries. \
Provide detailed explanations and code snippets when necessary. \
Ensure your responses are clear and concise.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeAssistState {
    pub user_query: String,
    /// Latest answer; for coding questions the code under validation.
    pub llm_code: Option<String>,
    /// Validator score in percent.
    pub accuracy: Option<f64>,
    pub is_coding_question: Option<bool>,
    pub retry_count: u32,
}

impl CodeAssistState {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Default::default()
        }
    }
}

fn answer_options() -> GenerateOptions {
    GenerateOptions::default()
        .with_max_output_tokens(1000)
        .with_temperature(0.5)
}

async fn classify_query(
    llm: &dyn LlmClient,
    mut state: CodeAssistState,
) -> Result<CodeAssistState, AgentError> {
    let schema = json!({
        "type": "object",
        "properties": {"is_coding_question": {"type": "boolean"}},
        "required": ["is_coding_question"]
    });
    let reply = llm
        .invoke_structured(
            &[
                Message::system(CLASSIFY_PROMPT),
                Message::user(state.user_query.clone()),
            ],
            &schema,
            &GenerateOptions::default(),
        )
        .await?;
    let is_coding = reply["is_coding_question"].as_bool().ok_or_else(|| {
        AgentError::Provider(format!("classifier reply lacks is_coding_question: {}", reply))
    })?;
    state.is_coding_question = Some(is_coding);
    Ok(state)
}

async fn answer(
    llm: &dyn LlmClient,
    system_prompt: &str,
    mut state: CodeAssistState,
) -> Result<CodeAssistState, AgentError> {
    let reply = llm
        .invoke(
            &[
                Message::system(system_prompt),
                Message::user(state.user_query.clone()),
            ],
            &answer_options(),
        )
        .await?;
    state.llm_code = Some(reply.content);
    Ok(state)
}

async fn coding_validate_chat_bot(
    llm: &dyn LlmClient,
    mut state: CodeAssistState,
) -> Result<CodeAssistState, AgentError> {
    let prompt = format!(
        "You are a coding validation assistant that checks the correctness of code-related queries. \
Return the percentage accuracy of the code response.\nUser query: {}\nCode to validate: {}",
        state.user_query,
        state.llm_code.as_deref().unwrap_or_default()
    );
    let schema = json!({
        "type": "object",
        "properties": {"accuracy": {"type": "number"}},
        "required": ["accuracy"]
    });
    let reply = llm
        .invoke_structured(
            &[
                Message::system(prompt),
                Message::user(state.user_query.clone()),
            ],
            &schema,
            &GenerateOptions::default(),
        )
        .await?;
    let accuracy = reply["accuracy"].as_f64().ok_or_else(|| {
        AgentError::Provider(format!("validator reply lacks accuracy: {}", reply))
    })?;
    state.accuracy = Some(accuracy);
    Ok(state)
}

fn route_query(state: &CodeAssistState) -> String {
    match state.is_coding_question {
        Some(true) => CODING_CHAT_BOT.to_string(),
        _ => GENERAL_CHAT_BOT.to_string(),
    }
}

/// Retry while the answer is below threshold and attempts remain.
fn coding_accuracy_check(
    guard: RetryGuard,
) -> impl Fn(&CodeAssistState) -> String + Send + Sync + 'static {
    move |state: &CodeAssistState| {
        let next = guard.route(state.accuracy, state.retry_count, INCREMENT_RETRY_COUNT);
        tracing::info!(
            accuracy = ?state.accuracy,
            retry_count = state.retry_count,
            next,
            "coding accuracy check"
        );
        next.to_string()
    }
}

/// Builds the code-assist graph over `llm`. Compile with `.compile()`.
pub fn build_graph(llm: Arc<dyn LlmClient>) -> StateGraph<CodeAssistState> {
    let mut graph = StateGraph::<CodeAssistState>::new();

    let classifier = llm.clone();
    graph.add_node_fn(CLASSIFY_QUERY, move |s: CodeAssistState| {
        let llm = classifier.clone();
        async move { classify_query(llm.as_ref(), s).await }
    });
    let general = llm.clone();
    graph.add_node_fn(GENERAL_CHAT_BOT, move |s: CodeAssistState| {
        let llm = general.clone();
        async move { answer(llm.as_ref(), GENERAL_PROMPT, s).await }
    });
    let coder = llm.clone();
    graph.add_node_fn(CODING_CHAT_BOT, move |s: CodeAssistState| {
        let llm = coder.clone();
        async move { answer(llm.as_ref(), CODING_PROMPT, s).await }
    });
    let validator = llm;
    graph.add_node_fn(CODING_VALIDATE_CHAT_BOT, move |s: CodeAssistState| {
        let llm = validator.clone();
        async move { coding_validate_chat_bot(llm.as_ref(), s).await }
    });
    graph.add_node_fn(INCREMENT_RETRY_COUNT, |mut s: CodeAssistState| async move {
        s.retry_count += 1;
        Ok(s)
    });

    graph.add_edge(START, CLASSIFY_QUERY);
    graph.add_conditional_edges(
        CLASSIFY_QUERY,
        route_query,
        [GENERAL_CHAT_BOT, CODING_CHAT_BOT],
    );
    graph.add_edge(GENERAL_CHAT_BOT, END);
    graph.add_edge(CODING_CHAT_BOT, CODING_VALIDATE_CHAT_BOT);
    graph.add_conditional_edges(
        CODING_VALIDATE_CHAT_BOT,
        coding_accuracy_check(RetryGuard::new(ACCURACY_THRESHOLD, MAX_RETRIES)),
        [INCREMENT_RETRY_COUNT, END],
    );
    graph.add_edge(INCREMENT_RETRY_COUNT, CODING_CHAT_BOT);
    graph
}
