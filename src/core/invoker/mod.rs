//! Model invocation
//!
//! A [`ModelInvoker`] turns `(model, prompt)` into generated text. The gateway
//! ships an OpenAI-compatible HTTP client and a registry that routes model
//! identifiers across configured providers.

mod error;
mod openai_compatible;
mod registry;

pub use error::InvocationError;
pub use openai_compatible::OpenAICompatibleInvoker;
pub use registry::InvokerRegistry;

use async_trait::async_trait;

/// Generates text for a prompt with a named model
#[async_trait]
pub trait ModelInvoker: Send + Sync + std::fmt::Debug {
    /// Run `prompt` through `model`
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, InvocationError>;
}
