use crate::core::batch::{
    Batch, BatchProgress, MergeOutcome, ModelResult, Word, WordResult, derive_status,
};
use crate::storage::BatchStore;
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use std::collections::BTreeSet;
use tracing::debug;

use super::super::entities::{self, batch_word, word_result};
use super::types::{DatabaseBackendType, SeaOrmBatchStore};

/// Rows per INSERT when persisting word lists
const WORD_INSERT_CHUNK: usize = 200;

fn to_count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

impl SeaOrmBatchStore {
    fn to_batch(model: entities::batch::Model, rows: Vec<word_result::Model>) -> Result<Batch> {
        let progress = BatchProgress {
            completed: to_count(model.completed),
            failed: to_count(model.failed),
            total: to_count(model.total),
        };

        let output = rows
            .into_iter()
            .filter(|row| row.outcome == word_result::OUTCOME_COMPLETED)
            .map(|row| -> Result<WordResult> {
                let results: Vec<ModelResult> =
                    serde_json::from_str(row.results.as_deref().unwrap_or("[]"))?;
                Ok(WordResult {
                    word_id: row.word_id,
                    results,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            id: model.id,
            status: derive_status(progress.completed, progress.failed, progress.total),
            error: model.error,
            progress,
            output,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    async fn find_batch<C: ConnectionTrait>(
        conn: &C,
        batch_id: &str,
    ) -> Result<entities::batch::Model> {
        entities::Batch::find_by_id(batch_id)
            .one(conn)
            .await
            .map_err(GatewayError::Database)?
            .ok_or_else(|| GatewayError::not_found(format!("Batch {} not found", batch_id)))
    }

    /// Insert a word outcome keyed by `(batch_id, word_id)` and bump the
    /// matching counter, all in one transaction. A conflicting row means the
    /// word was already recorded and nothing is touched.
    ///
    /// The transaction opens with a write on the batch row. SQLite only waits
    /// on a busy lock when the transaction has not read yet, and Postgres
    /// serializes merges for one batch on that row lock.
    async fn merge_outcome(
        &self,
        batch_id: &str,
        word_id: &str,
        outcome: &str,
        results: Option<String>,
        error: Option<String>,
    ) -> Result<MergeOutcome> {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let txn = self.db.begin().await.map_err(GatewayError::Database)?;

        let touched = entities::Batch::update_many()
            .col_expr(entities::batch::Column::UpdatedAt, Expr::value(now))
            .filter(entities::batch::Column::Id.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;
        if touched.rows_affected == 0 {
            txn.rollback().await.map_err(GatewayError::Database)?;
            return Err(GatewayError::not_found(format!(
                "Batch {} not found",
                batch_id
            )));
        }

        let Some(word) =
            entities::BatchWord::find_by_id((batch_id.to_string(), word_id.to_string()))
                .one(&txn)
                .await
                .map_err(GatewayError::Database)?
        else {
            txn.rollback().await.map_err(GatewayError::Database)?;
            return Err(GatewayError::not_found(format!(
                "Word {} not found in batch {}",
                word_id, batch_id
            )));
        };

        let row = word_result::ActiveModel {
            batch_id: Set(batch_id.to_string()),
            word_id: Set(word_id.to_string()),
            position: Set(word.position),
            outcome: Set(outcome.to_string()),
            results: Set(results),
            error: Set(error.clone()),
            created_at: Set(now),
        };

        let inserted = entities::WordResult::insert(row)
            .on_conflict(
                OnConflict::columns([word_result::Column::BatchId, word_result::Column::WordId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(GatewayError::Database)?;

        if inserted == 0 {
            // leave updated_at as it was
            txn.rollback().await.map_err(GatewayError::Database)?;
            debug!(batch_id = %batch_id, word_id = %word_id, "Word already merged");
            return Ok(MergeOutcome::duplicate());
        }

        let update = if outcome == word_result::OUTCOME_COMPLETED {
            entities::Batch::update_many().col_expr(
                entities::batch::Column::Completed,
                Expr::col(entities::batch::Column::Completed).add(1),
            )
        } else {
            entities::Batch::update_many()
                .col_expr(
                    entities::batch::Column::Failed,
                    Expr::col(entities::batch::Column::Failed).add(1),
                )
                .col_expr(entities::batch::Column::Error, Expr::value(error))
        };

        update
            .filter(entities::batch::Column::Id.eq(batch_id))
            .exec(&txn)
            .await
            .map_err(GatewayError::Database)?;

        txn.commit().await.map_err(GatewayError::Database)?;
        Ok(MergeOutcome::applied())
    }

    /// Open a transaction whose reads all see one snapshot
    async fn begin_snapshot(&self) -> Result<DatabaseTransaction> {
        let isolation = match self.backend_type {
            DatabaseBackendType::PostgreSQL => Some(IsolationLevel::RepeatableRead),
            // a SQLite read transaction is already a snapshot
            DatabaseBackendType::SQLite => None,
        };
        self.db
            .begin_with_config(isolation, None)
            .await
            .map_err(GatewayError::Database)
    }
}

#[async_trait]
impl BatchStore for SeaOrmBatchStore {
    async fn create_batch(&self, batch_id: &str, words: &[Word]) -> Result<Batch> {
        debug!("Creating batch: {}", batch_id);

        let total = i32::try_from(words.len())
            .map_err(|_| GatewayError::invalid_request("Batch is too large"))?;
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let batch = entities::batch::ActiveModel {
            id: Set(batch_id.to_string()),
            total: Set(total),
            completed: Set(0),
            failed: Set(0),
            error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // insert first so the transaction starts as a writer
        let txn = self.db.begin().await.map_err(GatewayError::Database)?;
        let model = batch.insert(&txn).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                GatewayError::conflict(format!("Batch {} already exists", batch_id))
            } else {
                GatewayError::Database(e)
            }
        })?;

        let rows = words
            .iter()
            .enumerate()
            .map(|(position, word)| -> Result<batch_word::ActiveModel> {
                Ok(batch_word::ActiveModel {
                    batch_id: Set(batch_id.to_string()),
                    word_id: Set(word.id.clone()),
                    position: Set(position as i32),
                    prompt: Set(word.prompt.clone()),
                    models: Set(serde_json::to_string(&word.models)?),
                    enqueued: Set(false),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for chunk in rows.chunks(WORD_INSERT_CHUNK) {
            entities::BatchWord::insert_many(chunk.to_vec())
                .exec_without_returning(&txn)
                .await
                .map_err(GatewayError::Database)?;
        }

        txn.commit().await.map_err(GatewayError::Database)?;
        Self::to_batch(model, Vec::new())
    }

    async fn merge_word_result(
        &self,
        batch_id: &str,
        word_id: &str,
        results: Vec<ModelResult>,
    ) -> Result<MergeOutcome> {
        let results = serde_json::to_string(&results)?;
        self.merge_outcome(
            batch_id,
            word_id,
            word_result::OUTCOME_COMPLETED,
            Some(results),
            None,
        )
        .await
    }

    async fn merge_word_failure(
        &self,
        batch_id: &str,
        word_id: &str,
        error: &str,
    ) -> Result<MergeOutcome> {
        self.merge_outcome(
            batch_id,
            word_id,
            word_result::OUTCOME_FAILED,
            None,
            Some(error.to_string()),
        )
        .await
    }

    async fn read_batch(&self, batch_id: &str) -> Result<Option<Batch>> {
        let txn = self.begin_snapshot().await?;

        let Some(model) = entities::Batch::find_by_id(batch_id)
            .one(&txn)
            .await
            .map_err(GatewayError::Database)?
        else {
            txn.rollback().await.map_err(GatewayError::Database)?;
            return Ok(None);
        };

        let rows = entities::WordResult::find()
            .filter(word_result::Column::BatchId.eq(batch_id))
            .order_by_asc(word_result::Column::Position)
            .all(&txn)
            .await
            .map_err(GatewayError::Database)?;

        txn.commit().await.map_err(GatewayError::Database)?;
        Self::to_batch(model, rows).map(Some)
    }

    async fn load_words(&self, batch_id: &str) -> Result<Vec<Word>> {
        Self::find_batch(&self.db, batch_id).await?;

        entities::BatchWord::find()
            .filter(batch_word::Column::BatchId.eq(batch_id))
            .order_by_asc(batch_word::Column::Position)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?
            .into_iter()
            .map(|row| -> Result<Word> {
                let models: Vec<String> = serde_json::from_str(&row.models)?;
                Ok(Word {
                    id: row.word_id,
                    prompt: row.prompt,
                    models,
                })
            })
            .collect()
    }

    async fn enqueued_words(&self, batch_id: &str) -> Result<BTreeSet<u32>> {
        Self::find_batch(&self.db, batch_id).await?;

        let positions: Vec<i32> = entities::BatchWord::find()
            .select_only()
            .column(batch_word::Column::Position)
            .filter(batch_word::Column::BatchId.eq(batch_id))
            .filter(batch_word::Column::Enqueued.eq(true))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(positions.into_iter().map(to_count).collect())
    }

    async fn mark_enqueued(&self, batch_id: &str, index: u32) -> Result<()> {
        let position = i32::try_from(index)
            .map_err(|_| GatewayError::validation(format!("Word index {} out of range", index)))?;

        let updated = entities::BatchWord::update_many()
            .col_expr(batch_word::Column::Enqueued, Expr::value(true))
            .filter(batch_word::Column::BatchId.eq(batch_id))
            .filter(batch_word::Column::Position.eq(position))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        if updated.rows_affected == 0 {
            return Err(GatewayError::validation(format!(
                "Word index {} out of range for batch {}",
                index, batch_id
            )));
        }
        Ok(())
    }

    async fn pending_orchestrations(&self) -> Result<Vec<String>> {
        let ids: Vec<String> = entities::BatchWord::find()
            .select_only()
            .column(batch_word::Column::BatchId)
            .filter(batch_word::Column::Enqueued.eq(false))
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        if ids.is_empty() {
            return Ok(ids);
        }

        // oldest first
        let batches: Vec<String> = entities::Batch::find()
            .select_only()
            .column(entities::batch::Column::Id)
            .filter(entities::batch::Column::Id.is_in(ids))
            .order_by_asc(entities::batch::Column::CreatedAt)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(batches)
    }

    async fn health_check(&self) -> Result<()> {
        self.ping().await
    }
}
