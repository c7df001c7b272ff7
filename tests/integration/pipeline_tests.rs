//! End-to-end pipeline tests: SeaORM store, in-process queue, scripted models

#[cfg(test)]
mod tests {
    use crate::common::assert_ok;
    use crate::common::assertions::BatchAssertions;
    use crate::common::fixtures::{consumer_config, orchestrator_config, words};
    use crate::common::{ScriptedInvoker, TestDatabase};
    use llm_batch_gateway::core::batch::{
        Batch, BatchOrchestrator, BatchStatus, JobConsumer, JobMessage, Word,
    };
    use llm_batch_gateway::core::queue::{JobQueue, MemoryQueue};
    use llm_batch_gateway::storage::BatchStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::task::JoinHandle;

    struct Harness {
        db: TestDatabase,
        queue: Arc<MemoryQueue>,
        invoker: Arc<ScriptedInvoker>,
        orchestrator: BatchOrchestrator,
        shutdown: watch::Sender<bool>,
        consumer: JoinHandle<()>,
    }

    impl Harness {
        async fn start(invoker: ScriptedInvoker, max_attempts: Option<u32>) -> Self {
            let db = TestDatabase::new().await;
            let queue = Arc::new(MemoryQueue::with_poll_interval(Duration::from_millis(10)));
            let invoker = Arc::new(invoker);

            let orchestrator =
                BatchOrchestrator::new(db.store_arc(), queue.clone(), orchestrator_config());
            let consumer = Arc::new(JobConsumer::new(
                db.store_arc(),
                invoker.clone(),
                consumer_config(max_attempts),
            ));

            let (shutdown, rx) = watch::channel(false);
            let consumer = consumer.spawn(queue.clone(), rx);

            Self {
                db,
                queue,
                invoker,
                orchestrator,
                shutdown,
                consumer,
            }
        }

        async fn submit(&self, words: Vec<Word>) -> Batch {
            let batch = assert_ok!(self.orchestrator.create(words.clone()).await);
            assert_ok!(self.orchestrator.submit(&batch.id, &words).await);
            batch
        }

        async fn read(&self, batch_id: &str) -> Batch {
            assert_ok!(self.db.store().read_batch(batch_id).await).expect("batch exists")
        }

        /// Poll until `done` holds, for at most two seconds
        async fn wait_until(&self, batch_id: &str, done: impl Fn(&Batch) -> bool) -> Batch {
            for _ in 0..200 {
                let batch = self.read(batch_id).await;
                if done(&batch) {
                    return batch;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("batch {} did not reach the expected state", batch_id);
        }

        async fn stop(self) {
            self.shutdown.send(true).expect("consumer is listening");
            self.consumer.await.expect("consumer task");
        }
    }

    #[tokio::test]
    async fn test_single_word_batch_completes() {
        let harness = Harness::start(ScriptedInvoker::new(), None).await;
        let batch = harness
            .submit(vec![Word::new("w1", "hi", ["m1", "m2"])])
            .await;

        batch.assert_progress(BatchStatus::Queued, 0, 0, 1);
        assert_eq!(serde_json::to_value(&batch).unwrap()["output"], json!(null));

        let done = harness
            .wait_until(&batch.id, |b| b.status == BatchStatus::Complete)
            .await;
        done.assert_progress(BatchStatus::Complete, 1, 0, 1);
        assert_eq!(
            serde_json::to_value(&done).unwrap()["output"],
            json!([{
                "id": "w1",
                "results": [
                    {"model": "m1", "result": "m1:hi"},
                    {"model": "m2", "result": "m2:hi"}
                ]
            }])
        );

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_failing_word_does_not_block_the_rest() {
        let harness = Harness::start(ScriptedInvoker::failing(&["p2"]), None).await;
        let batch = harness.submit(words(3)).await;

        let running = harness
            .wait_until(&batch.id, |b| b.progress.completed == 2)
            .await;
        // give the failing word a few more deliveries
        tokio::time::sleep(Duration::from_millis(150)).await;
        let running = {
            let again = harness.read(&batch.id).await;
            assert_eq!(again.progress, running.progress);
            again
        };
        running.assert_progress(BatchStatus::Running, 2, 0, 3);
        running.assert_output_ids(&["w1", "w3"]);

        // the retried job goes through once the model recovers
        harness.invoker.recover("p2");
        let done = harness
            .wait_until(&batch.id, |b| b.status == BatchStatus::Complete)
            .await;
        done.assert_progress(BatchStatus::Complete, 3, 0, 3);
        done.assert_output_ids(&["w1", "w2", "w3"]);

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_dead_letter_completes_batch() {
        let harness = Harness::start(ScriptedInvoker::failing(&["p2"]), Some(2)).await;
        let batch = harness.submit(words(3)).await;

        let done = harness
            .wait_until(&batch.id, |b| b.status == BatchStatus::Complete)
            .await;
        done.assert_progress(BatchStatus::Complete, 2, 1, 3);
        done.assert_output_ids(&["w1", "w3"]);
        assert!(done.error.as_deref().unwrap_or_default().contains("scripted failure"));

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_redelivered_job_counts_once() {
        let harness = Harness::start(ScriptedInvoker::new(), None).await;
        let input = words(2);
        let batch = assert_ok!(harness.orchestrator.create(input.clone()).await);

        // at-least-once: the same job arrives three times
        for _ in 0..3 {
            let job = JobMessage::new(batch.id.clone(), input[0].clone());
            assert_ok!(harness.queue.enqueue(job).await);
        }
        let job = JobMessage::new(batch.id.clone(), input[1].clone());
        assert_ok!(harness.queue.enqueue(job).await);

        let done = harness
            .wait_until(&batch.id, |b| b.status == BatchStatus::Complete)
            .await;
        done.assert_progress(BatchStatus::Complete, 2, 0, 2);
        done.assert_output_ids(&["w1", "w2"]);

        // let any straggling duplicate settle, then re-check
        tokio::time::sleep(Duration::from_millis(50)).await;
        harness
            .read(&batch.id)
            .await
            .assert_progress(BatchStatus::Complete, 2, 0, 2);
        assert_eq!(harness.queue.outstanding(), 0);

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_interrupted_emission_resumes_after_restart() {
        let harness = Harness::start(ScriptedInvoker::new(), None).await;
        let input = words(3);
        let batch = assert_ok!(harness.orchestrator.create(input.clone()).await);

        // a previous process emitted word 1 and then died
        let job = JobMessage::new(batch.id.clone(), input[0].clone());
        assert_ok!(harness.queue.enqueue(job).await);
        assert_ok!(harness.db.store().mark_enqueued(&batch.id, 0).await);

        assert_eq!(assert_ok!(harness.orchestrator.resume_pending().await), 1);
        assert!(assert_ok!(harness.db.store().pending_orchestrations().await).is_empty());

        let done = harness
            .wait_until(&batch.id, |b| b.status == BatchStatus::Complete)
            .await;
        done.assert_progress(BatchStatus::Complete, 3, 0, 3);
        // two models per word, each word invoked exactly once
        assert_eq!(harness.invoker.calls(), 6);

        harness.stop().await;
    }
}
