//! # llm-batch-gateway
//!
//! Batch prompt gateway. Clients submit a batch of words (a prompt plus the
//! models to run it against); the gateway persists the batch, emits one job per
//! word onto an at-least-once queue, and a pool of consumers fans every job
//! out to the models and merges the results back into the batch.
//!
//! ## Features
//!
//! - **Idempotent merges**: redelivered jobs never double-count a word
//! - **Resumable emission**: a restarted server finishes half-emitted batches
//! - **Pluggable transports**: in-process queue or Redis Streams
//! - **Pluggable storage**: in-memory or SeaORM (SQLite / Postgres)
//! - **OpenAI-compatible backends**: any `/chat/completions` endpoint
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use llm_batch_gateway::{Config, Gateway, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run(Role::All).await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::batch::{
    Batch, BatchOrchestrator, BatchProgress, BatchStatus, JobConsumer, JobMessage, ModelResult,
    Word, WordResult,
};
pub use core::invoker::{InvocationError, InvokerRegistry, ModelInvoker};
pub use core::queue::{Delivery, JobQueue, JobReceiver};
pub use core::{Gateway, Role};
pub use storage::BatchStore;

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
