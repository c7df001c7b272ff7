use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Batches::Total).integer().not_null())
                    .col(
                        ColumnDef::new(Batches::Completed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Batches::Failed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Batches::Error).text().null())
                    .col(
                        ColumnDef::new(Batches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Batches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BatchWords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BatchWords::BatchId).string().not_null())
                    .col(ColumnDef::new(BatchWords::WordId).string().not_null())
                    .col(ColumnDef::new(BatchWords::Position).integer().not_null())
                    .col(ColumnDef::new(BatchWords::Prompt).text().not_null())
                    .col(ColumnDef::new(BatchWords::Models).text().not_null())
                    .col(
                        ColumnDef::new(BatchWords::Enqueued)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .col(BatchWords::BatchId)
                            .col(BatchWords::WordId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_batch_words_batch_id")
                            .from(BatchWords::Table, BatchWords::BatchId)
                            .to(Batches::Table, Batches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WordResults::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WordResults::BatchId).string().not_null())
                    .col(ColumnDef::new(WordResults::WordId).string().not_null())
                    .col(ColumnDef::new(WordResults::Position).integer().not_null())
                    .col(ColumnDef::new(WordResults::Outcome).string().not_null())
                    .col(ColumnDef::new(WordResults::Results).text().null())
                    .col(ColumnDef::new(WordResults::Error).text().null())
                    .col(
                        ColumnDef::new(WordResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(WordResults::BatchId)
                            .col(WordResults::WordId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_word_results_batch_id")
                            .from(WordResults::Table, WordResults::BatchId)
                            .to(Batches::Table, Batches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batch_words_enqueued")
                    .table(BatchWords::Table)
                    .col(BatchWords::Enqueued)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_word_results_position")
                    .table(WordResults::Table)
                    .col(WordResults::BatchId)
                    .col(WordResults::Position)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WordResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BatchWords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Batches::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Batches {
    Table,
    Id,
    Total,
    Completed,
    Failed,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BatchWords {
    Table,
    BatchId,
    WordId,
    Position,
    Prompt,
    Models,
    Enqueued,
}

#[derive(DeriveIden)]
enum WordResults {
    Table,
    BatchId,
    WordId,
    Position,
    Outcome,
    Results,
    Error,
    CreatedAt,
}
