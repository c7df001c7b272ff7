//! Utility modules for the Gateway
//!
//! - **error**: error type and HTTP error mapping
//! - **logging**: tracing subscriber setup

pub mod error; // Error handling
pub mod logging; // Logging & monitoring
