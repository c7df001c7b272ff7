//! Batch status aggregation
//!
//! Status is a pure function of the word counters, so the write path (after a
//! merge) and the read path (from stored counters) always agree.

use super::types::BatchStatus;

/// Derive the aggregate status from word counters.
///
/// An empty batch (`total == 0`) is QUEUED; submission rejects empty
/// batches, so this only keeps the function total.
pub fn derive_status(completed: u32, failed: u32, total: u32) -> BatchStatus {
    let finished = completed.saturating_add(failed);

    if total == 0 || finished == 0 {
        BatchStatus::Queued
    } else if finished >= total {
        BatchStatus::Complete
    } else {
        BatchStatus::Running
    }
}
