use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Batch record; status is derived from the counters on read
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    /// Batch ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Word count, fixed at creation
    pub total: i32,

    /// Words merged successfully
    pub completed: i32,

    /// Words dead-lettered
    pub failed: i32,

    /// Last dead-letter message
    pub error: Option<String>,

    /// Batch creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Last merge timestamp
    pub updated_at: DateTimeWithTimeZone,
}

/// Batch entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batch_word::Entity")]
    BatchWord,
    #[sea_orm(has_many = "super::word_result::Entity")]
    WordResult,
}

impl Related<super::batch_word::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchWord.def()
    }
}

impl Related<super::word_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WordResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
