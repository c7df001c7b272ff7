//! Word and batch fixtures

use llm_batch_gateway::core::batch::{ConsumerConfig, ModelResult, OrchestratorConfig, Word};
use std::time::Duration;

/// `n` words `w1..=wn`, each with prompt `p<i>` and models `m1`, `m2`
pub fn words(n: usize) -> Vec<Word> {
    (1..=n)
        .map(|i| Word::new(format!("w{}", i), format!("p{}", i), ["m1", "m2"]))
        .collect()
}

/// Single-model results tagged with `tag`
pub fn results(tag: &str) -> Vec<ModelResult> {
    vec![ModelResult::new("m1", tag)]
}

/// Encode words the way clients submit them
pub fn ndjson(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| serde_json::to_string(w).expect("word serializes"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Consumer settings with short delays
pub fn consumer_config(max_attempts: Option<u32>) -> ConsumerConfig {
    ConsumerConfig {
        retry_delay: Duration::from_millis(50),
        max_attempts,
        concurrency: 4,
        receive_batch_size: 8,
        poll_interval: Duration::from_millis(10),
        ..ConsumerConfig::default()
    }
}

/// Orchestrator settings with short delays
pub fn orchestrator_config() -> OrchestratorConfig {
    OrchestratorConfig {
        max_attempts: 2,
        retry_delay: Duration::from_millis(1),
    }
}
