//! Batch processing pipeline
//!
//! A batch is a list of words, each a prompt plus the models it should run
//! against. The [`BatchOrchestrator`] persists the batch and emits one job per
//! word; the [`JobConsumer`] runs each job's models and merges the results
//! back into the batch record.

mod consumer;
mod fanout;
mod input;
mod orchestrator;
mod status;
mod types;


// Re-export all public types
pub use consumer::{ConsumerConfig, JobConsumer, JobOutcome};
pub use fanout::{FanOutConfig, ModelFanOut};
pub use input::parse_ndjson;
pub use orchestrator::{BatchOrchestrator, EmissionReport, OrchestratorConfig};
pub use status::derive_status;
pub use types::{
    Batch, BatchProgress, BatchStatus, JobMessage, MergeOutcome, ModelResult, Word, WordResult,
    new_batch_id, validate_words,
};
