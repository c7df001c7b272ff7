//! Common test utilities for llm-batch-gateway
//!
//! # Usage
//!
//! ```rust
//! use crate::common::{TestDatabase, fixtures, invokers};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let db = TestDatabase::new().await;
//!     let words = fixtures::words(3);
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod database;
pub mod fixtures;
pub mod invokers;

// Re-export commonly used items
pub use database::TestDatabase;
pub use invokers::ScriptedInvoker;

// Result assertions that hand back the unwrapped value
pub use tokio_test::{assert_err, assert_ok};
