use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Submitted word and its emission checkpoint
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_words")]
pub struct Model {
    /// Owning batch
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_id: String,

    /// Word ID, unique within the batch
    #[sea_orm(primary_key, auto_increment = false)]
    pub word_id: String,

    /// Zero-based input position
    pub position: i32,

    /// Prompt text
    #[sea_orm(column_type = "Text")]
    pub prompt: String,

    /// Model identifiers (JSON array)
    #[sea_orm(column_type = "Text")]
    pub models: String,

    /// Whether the word's job was emitted onto the queue
    pub enqueued: bool,
}

/// Batch word entity relations
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
