//! SeaORM batch store tests on in-memory SQLite

#[cfg(test)]
mod tests {
    use crate::common::TestDatabase;
    use crate::common::assertions::BatchAssertions;
    use crate::common::fixtures::{results, words};
    use crate::common::{assert_err, assert_ok};
    use llm_batch_gateway::GatewayError;
    use llm_batch_gateway::core::batch::BatchStatus;
    use llm_batch_gateway::storage::BatchStore;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_create_and_read_skeleton() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let created = assert_ok!(store.create_batch("b1", &words(3)).await);
        created.assert_progress(BatchStatus::Queued, 0, 0, 3);
        assert!(created.output.is_empty());

        let read = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        read.assert_progress(BatchStatus::Queued, 0, 0, 3);
        assert_eq!(read.id, "b1");

        assert!(assert_ok!(store.read_batch("missing").await).is_none());
    }

    #[tokio::test]
    async fn test_duplicate_batch_id_conflicts() {
        let db = TestDatabase::new().await;
        let store = db.store();

        assert_ok!(store.create_batch("b1", &words(1)).await);
        let err = assert_err!(store.create_batch("b1", &words(2)).await);
        assert!(matches!(err, GatewayError::Conflict(_)));

        // the original word list is untouched
        assert_eq!(assert_ok!(store.load_words("b1").await).len(), 1);
    }

    #[tokio::test]
    async fn test_load_words_preserves_input() {
        let db = TestDatabase::new().await;
        let store = db.store();
        let input = words(4);

        assert_ok!(store.create_batch("b1", &input).await);
        assert_eq!(assert_ok!(store.load_words("b1").await), input);

        let err = assert_err!(store.load_words("missing").await);
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let db = TestDatabase::new().await;
        let store = db.store();
        assert_ok!(store.create_batch("b1", &words(2)).await);

        let first = assert_ok!(store.merge_word_result("b1", "w1", results("a")).await);
        let again = assert_ok!(store.merge_word_result("b1", "w1", results("b")).await);
        assert!(!first.already_merged);
        assert!(again.already_merged);

        let batch = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Running, 1, 0, 2);
        batch.assert_output_ids(&["w1"]);
        assert_eq!(batch.output[0].results[0].result, "a");
    }

    #[tokio::test]
    async fn test_output_follows_input_order() {
        let db = TestDatabase::new().await;
        let store = db.store();
        assert_ok!(store.create_batch("b1", &words(3)).await);

        for id in ["w2", "w3", "w1"] {
            assert_ok!(store.merge_word_result("b1", id, results(id)).await);
        }

        let batch = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Complete, 3, 0, 3);
        batch.assert_output_ids(&["w1", "w2", "w3"]);
    }

    #[tokio::test]
    async fn test_concurrent_merges_count_once() {
        let db = TestDatabase::new().await;
        let store = db.store_arc();
        assert_ok!(store.create_batch("b1", &words(3)).await);

        let mut handles = Vec::new();
        for round in 0..3 {
            for id in ["w1", "w2", "w3"] {
                let store = store.clone();
                let tag = format!("{}-{}", id, round);
                handles.push(tokio::spawn(async move {
                    store.merge_word_result("b1", id, results(&tag)).await
                }));
            }
        }

        let mut applied = 0;
        for handle in handles {
            let outcome = assert_ok!(handle.await.expect("merge task"));
            if !outcome.already_merged {
                applied += 1;
            }
        }
        assert_eq!(applied, 3);

        let batch = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Complete, 3, 0, 3);
        assert_eq!(batch.output.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_counts_and_blocks_late_result() {
        let db = TestDatabase::new().await;
        let store = db.store();
        assert_ok!(store.create_batch("b1", &words(2)).await);

        let failed = assert_ok!(store.merge_word_failure("b1", "w2", "model down").await);
        assert!(!failed.already_merged);
        let late = assert_ok!(store.merge_word_result("b1", "w2", results("x")).await);
        assert!(late.already_merged);

        let batch = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Running, 0, 1, 2);
        assert_eq!(batch.error.as_deref(), Some("model down"));
        assert!(batch.output.is_empty());

        assert_ok!(store.merge_word_result("b1", "w1", results("ok")).await);
        let batch = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Complete, 1, 1, 2);
        batch.assert_output_ids(&["w1"]);
    }

    #[tokio::test]
    async fn test_merge_into_unknown_word_or_batch() {
        let db = TestDatabase::new().await;
        let store = db.store();
        assert_ok!(store.create_batch("b1", &words(1)).await);

        let err = assert_err!(store.merge_word_result("b1", "w9", results("x")).await);
        assert!(matches!(err, GatewayError::NotFound(_)));
        let err = assert_err!(store.merge_word_result("nope", "w1", results("x")).await);
        assert!(matches!(err, GatewayError::NotFound(_)));

        let batch = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Queued, 0, 0, 1);
    }

    #[tokio::test]
    async fn test_enqueue_checkpoint() {
        let db = TestDatabase::new().await;
        let store = db.store();
        assert_ok!(store.create_batch("b1", &words(3)).await);
        assert_ok!(store.create_batch("b2", &words(1)).await);

        let mut pending = assert_ok!(store.pending_orchestrations().await);
        pending.sort();
        assert_eq!(pending, vec!["b1".to_string(), "b2".to_string()]);

        assert_ok!(store.mark_enqueued("b1", 0).await);
        assert_ok!(store.mark_enqueued("b1", 2).await);
        assert_ok!(store.mark_enqueued("b1", 2).await);
        assert_eq!(
            assert_ok!(store.enqueued_words("b1").await),
            BTreeSet::from([0, 2])
        );
        assert!(store.mark_enqueued("b1", 7).await.is_err());

        assert_ok!(store.mark_enqueued("b2", 0).await);
        assert_eq!(
            assert_ok!(store.pending_orchestrations().await),
            vec!["b1".to_string()]
        );

        assert_ok!(store.mark_enqueued("b1", 1).await);
        assert!(assert_ok!(store.pending_orchestrations().await).is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let db = TestDatabase::new().await;
        assert_ok!(db.store().health_check().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pooled_file_database_merges_concurrently() {
        let db = TestDatabase::file_backed(10).await;
        let store = db.store_arc();
        assert_ok!(store.create_batch("b1", &words(16)).await);

        // every word twice: 32 merges racing over ten connections
        let mut merges = Vec::new();
        for i in 1..=16 {
            for round in 0..2 {
                let store = store.clone();
                let word_id = format!("w{}", i);
                let tag = format!("{}-{}", word_id, round);
                merges.push(tokio::spawn(async move {
                    store.merge_word_result("b1", &word_id, results(&tag)).await
                }));
            }
        }
        let outcomes = futures::future::join_all(merges).await;

        let mut applied = 0;
        for outcome in outcomes {
            let outcome = assert_ok!(outcome.expect("merge task"));
            if !outcome.already_merged {
                applied += 1;
            }
        }
        assert_eq!(applied, 16);

        let batch = assert_ok!(db.store().read_batch("b1").await).expect("batch exists");
        batch.assert_progress(BatchStatus::Complete, 16, 0, 16);
        assert_eq!(batch.output.len(), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reads_see_consistent_snapshot_during_merges() {
        let db = TestDatabase::file_backed(10).await;
        let store = db.store_arc();
        assert_ok!(store.create_batch("b1", &words(24)).await);

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 1..=24 {
                    let word_id = format!("w{}", i);
                    store
                        .merge_word_result("b1", &word_id, results(&word_id))
                        .await?;
                }
                Ok::<_, GatewayError>(())
            })
        };

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut reads = 0;
                loop {
                    let batch = store.read_batch("b1").await?.expect("batch exists");
                    // counters and output rows come from the same snapshot
                    assert_eq!(batch.output.len() as u32, batch.progress.completed);
                    reads += 1;
                    if batch.progress.completed == 24 {
                        return Ok::<_, GatewayError>(reads);
                    }
                }
            })
        };

        assert_ok!(writer.await.expect("writer task"));
        let reader = tokio::time::timeout(std::time::Duration::from_secs(30), reader)
            .await
            .expect("reader sees the last merge");
        let reads = assert_ok!(reader.expect("reader task"));
        assert!(reads >= 1);
    }

    #[tokio::test]
    async fn test_duplicate_merge_keeps_updated_at() {
        let db = TestDatabase::new().await;
        let store = db.store();
        assert_ok!(store.create_batch("b1", &words(1)).await);

        assert_ok!(store.merge_word_result("b1", "w1", results("first")).await);
        let before = assert_ok!(store.read_batch("b1").await).expect("batch exists");

        let outcome = assert_ok!(store.merge_word_result("b1", "w1", results("again")).await);
        assert!(outcome.already_merged);

        let after = assert_ok!(store.read_batch("b1").await).expect("batch exists");
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(after.output[0].results, results("first"));
    }
}

