use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome kind stored in `word_results.outcome`
pub const OUTCOME_COMPLETED: &str = "completed";
pub const OUTCOME_FAILED: &str = "failed";

/// Merged outcome of one word. The composite key makes merges idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "word_results")]
pub struct Model {
    /// Owning batch
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_id: String,

    /// Word ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub word_id: String,

    /// Input position of the word, for output ordering
    pub position: i32,

    /// `completed` or `failed`
    pub outcome: String,

    /// Per-model results (JSON array), set for completed words
    #[sea_orm(column_type = "Text", nullable)]
    pub results: Option<String>,

    /// Failure message, set for failed words
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,

    /// Merge timestamp
    pub created_at: DateTimeWithTimeZone,
}

/// Word result entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id",
        on_delete = "Cascade"
    )]
    Batch,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
