//! Custom test assertions

use llm_batch_gateway::core::batch::{Batch, BatchStatus};

/// Assertions for batch snapshots
pub trait BatchAssertions {
    /// Assert status and `(completed, failed, total)` together
    fn assert_progress(&self, status: BatchStatus, completed: u32, failed: u32, total: u32);

    /// Assert the ids of merged words, in output order
    fn assert_output_ids(&self, ids: &[&str]);
}

impl BatchAssertions for Batch {
    fn assert_progress(&self, status: BatchStatus, completed: u32, failed: u32, total: u32) {
        assert_eq!(
            (self.status, self.progress.completed, self.progress.failed, self.progress.total),
            (status, completed, failed, total),
            "unexpected progress for batch {}",
            self.id
        );
        assert!(self.progress.completed + self.progress.failed <= self.progress.total);
    }

    fn assert_output_ids(&self, ids: &[&str]) {
        let actual: Vec<&str> = self.output.iter().map(|r| r.word_id.as_str()).collect();
        assert_eq!(actual, ids, "unexpected output for batch {}", self.id);
    }
}
