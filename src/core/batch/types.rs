//! Batch processing types

use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One prompt and the models it should be evaluated against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Word {
    /// Identifier, unique within its batch
    pub id: String,
    /// Prompt text sent to every model
    pub prompt: String,
    /// Model identifiers, first occurrence order, no duplicates
    pub models: Vec<String>,
}

impl Word {
    /// Create a word, dropping repeated model identifiers
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        models: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut word = Self {
            id: id.into(),
            prompt: prompt.into(),
            models: models.into_iter().map(Into::into).collect(),
        };
        word.dedup_models();
        word
    }

    /// Remove repeated model identifiers, keeping the first occurrence
    pub fn dedup_models(&mut self) {
        let mut seen = HashSet::new();
        self.models.retain(|m| seen.insert(m.clone()));
    }

    /// Check the word carries everything a job needs
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(GatewayError::invalid_request("word id cannot be empty"));
        }
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::invalid_request(format!(
                "word '{}' is missing a prompt",
                self.id
            )));
        }
        if self.models.is_empty() {
            return Err(GatewayError::invalid_request(format!(
                "word '{}' must name at least one model",
                self.id
            )));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(GatewayError::invalid_request(format!(
                "word '{}' names an empty model",
                self.id
            )));
        }
        Ok(())
    }
}

/// Output of one model for one prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelResult {
    /// Model identifier
    pub model: String,
    /// Generated text
    pub result: String,
}

impl ModelResult {
    pub fn new(model: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            result: result.into(),
        }
    }
}

/// All model outputs for one word, in the word's model order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordResult {
    /// Word identifier
    #[serde(rename = "id")]
    pub word_id: String,
    /// Per-model results
    pub results: Vec<ModelResult>,
}

/// Aggregate batch status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// No word has finished yet
    Queued,
    /// Some but not all words have finished
    Running,
    /// Every word has finished
    Complete,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Queued => "queued",
            BatchStatus::Running => "running",
            BatchStatus::Complete => "complete",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Word counters for a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BatchProgress {
    /// Words merged successfully
    pub completed: u32,
    /// Words recorded as failed after exhausting their attempts
    pub failed: u32,
    /// Words in the batch, fixed at creation
    pub total: u32,
}

impl BatchProgress {
    pub fn new(total: u32) -> Self {
        Self {
            completed: 0,
            failed: 0,
            total,
        }
    }

    /// Words that reached a final outcome
    pub fn finished(&self) -> u32 {
        self.completed + self.failed
    }

    /// Derived aggregate status
    pub fn status(&self) -> BatchStatus {
        super::status::derive_status(self.completed, self.failed, self.total)
    }
}

/// Snapshot of a batch as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    /// Batch ID
    pub id: String,
    /// Aggregate status
    pub status: BatchStatus,
    /// Last word failure, if any word was dead-lettered
    pub error: Option<String>,
    /// Word counters
    pub progress: BatchProgress,
    /// Merged word results; serialized as `null` while empty
    #[serde(with = "null_when_empty")]
    pub output: Vec<WordResult>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last merge timestamp
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Fresh QUEUED skeleton for `total` words
    pub fn new(id: impl Into<String>, total: u32) -> Self {
        let now = Utc::now();
        let progress = BatchProgress::new(total);
        Self {
            id: id.into(),
            status: progress.status(),
            error: None,
            progress,
            output: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Output entry for `word_id`, if merged
    pub fn word_result(&self, word_id: &str) -> Option<&WordResult> {
        self.output.iter().find(|r| r.word_id == word_id)
    }

    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Complete
    }
}

/// Unit of work on the job queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobMessage {
    /// Owning batch
    pub batch_id: String,
    /// Word to evaluate
    pub word: Word,
}

impl JobMessage {
    pub fn new(batch_id: impl Into<String>, word: Word) -> Self {
        Self {
            batch_id: batch_id.into(),
            word,
        }
    }

    /// Idempotence key of the merge this job produces
    pub fn merge_key(&self) -> String {
        format!("{}:{}", self.batch_id, self.word.id)
    }
}

/// Result of folding a word outcome into its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The word had already been recorded; nothing changed
    pub already_merged: bool,
}

impl MergeOutcome {
    pub fn applied() -> Self {
        Self {
            already_merged: false,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            already_merged: true,
        }
    }
}

/// Generate a new opaque batch identifier
pub fn new_batch_id() -> String {
    format!("batch_{}", uuid::Uuid::new_v4().simple())
}

/// Validate a whole submission: non-empty, valid words, unique word ids
pub fn validate_words(words: &[Word]) -> Result<()> {
    if words.is_empty() {
        return Err(GatewayError::invalid_request(
            "Batch must contain at least one word",
        ));
    }

    if words.len() > u32::MAX as usize {
        return Err(GatewayError::invalid_request("Batch is too large"));
    }

    let mut ids = HashSet::new();
    for word in words {
        word.validate()?;
        if !ids.insert(word.id.as_str()) {
            return Err(GatewayError::invalid_request(format!(
                "duplicate word id '{}'",
                word.id
            )));
        }
    }

    Ok(())
}

mod null_when_empty {
    use super::WordResult;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        output: &[WordResult],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        if output.is_empty() {
            serializer.serialize_none()
        } else {
            output.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<WordResult>, D::Error> {
        Ok(Option::<Vec<WordResult>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
