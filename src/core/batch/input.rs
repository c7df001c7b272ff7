//! Batch submission parsing

use super::types::Word;
use crate::utils::error::{GatewayError, Result};
use serde::Deserialize;

/// One NDJSON record as submitted by clients
#[derive(Debug, Deserialize)]
struct WordRecord {
    id: String,
    prompt: String,
    #[serde(default)]
    models: Vec<String>,
}

/// Parse a newline-delimited JSON body into words.
///
/// Blank lines are skipped. Malformed lines fail the whole submission with
/// their 1-based line number.
pub fn parse_ndjson(body: &str) -> Result<Vec<Word>> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let record: WordRecord = serde_json::from_str(line).map_err(|e| {
                GatewayError::parsing(format!("line {}: invalid word record: {}", index + 1, e))
            })?;
            Ok(Word::new(record.id, record.prompt, record.models))
        })
        .collect()
}
