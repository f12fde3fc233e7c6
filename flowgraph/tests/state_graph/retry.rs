//! Bounded retry loop: generate → validate → increment_retry_count → generate.

use flowgraph::{RetryGuard, RunnableConfig};

use crate::common::{retry_graph, with_memory, CodeState};

/// **Scenario**: The validator never reaches the threshold; the loop stops after
/// exactly `max_retries` increments.
#[tokio::test]
async fn low_quality_stops_after_max_retries() {
    let compiled = retry_graph(0.0, RetryGuard::new(95.0, 3))
        .compile()
        .expect("compiles");
    let state = compiled
        .invoke(CodeState::new("write a parser"), None)
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.retry_count, 3);
    assert_eq!(
        state.trace.iter().filter(|t| *t == "generate").count(),
        4,
        "one first attempt plus three retries"
    );
    assert_eq!(state.llm_output.as_deref(), Some("attempt 3"));
}

/// **Scenario**: Quality at the threshold is accepted on the first pass.
#[tokio::test]
async fn quality_at_threshold_is_accepted() {
    let compiled = retry_graph(95.0, RetryGuard::new(95.0, 3))
        .compile()
        .expect("compiles");
    let state = compiled
        .invoke(CodeState::new("q"), None)
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.trace, vec!["generate", "validate"]);
}

/// **Scenario**: Exhaustion wins over quality: with max_retries 0 a bad answer ends the run.
#[tokio::test]
async fn exhausted_budget_ends_even_when_quality_is_low() {
    let compiled = retry_graph(10.0, RetryGuard::new(95.0, 0))
        .compile()
        .expect("compiles");
    let state = compiled
        .invoke(CodeState::new("q"), None)
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.trace, vec!["generate", "validate"]);
}

/// **Scenario**: Each loop iteration writes its own checkpoints; steps keep increasing.
#[tokio::test]
async fn retry_loop_checkpoints_every_iteration() {
    let compiled = with_memory(retry_graph(0.0, RetryGuard::new(95.0, 2)));
    let cfg = RunnableConfig::for_thread("retry");
    compiled
        .invoke(CodeState::new("q"), Some(cfg.clone()))
        .await
        .unwrap();
    let history = compiled.get_state_history(&cfg).await.unwrap();
    // generate, validate, then (increment, generate, validate) twice
    assert_eq!(history.len(), 8);
    let steps: Vec<u64> = history.iter().map(|c| c.metadata.step).collect();
    assert_eq!(steps, (0..8).collect::<Vec<_>>());
    assert_eq!(history[7].channel_values.retry_count, 2);
}
