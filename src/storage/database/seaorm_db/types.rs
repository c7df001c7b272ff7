use sea_orm::DatabaseConnection;

/// SeaORM-backed batch store
#[derive(Debug, Clone)]
pub struct SeaOrmBatchStore {
    pub(super) db: DatabaseConnection,
    /// Backend type indicator
    pub(super) backend_type: DatabaseBackendType,
}

/// Database backend type indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    PostgreSQL,
    SQLite,
}
