// Module declarations
mod types;
mod connection;
mod batch_ops;

// Re-export public types
pub use types::{DatabaseBackendType, SeaOrmBatchStore};
