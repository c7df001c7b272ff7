//! Scripted model invokers

use async_trait::async_trait;
use llm_batch_gateway::core::invoker::{InvocationError, ModelInvoker};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Answers `"<model>:<prompt>"`, failing for scripted prompts
#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    failing_prompts: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call for `prompt`
    pub fn failing(prompts: &[&str]) -> Self {
        let invoker = Self::new();
        invoker
            .failing_prompts
            .lock()
            .unwrap()
            .extend(prompts.iter().map(|p| p.to_string()));
        invoker
    }

    /// Stop failing for `prompt`
    pub fn recover(&self, prompt: &str) {
        self.failing_prompts.lock().unwrap().remove(prompt);
    }

    /// Model calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, InvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_prompts.lock().unwrap().contains(prompt) {
            return Err(InvocationError::backend(model, 503, "scripted failure"));
        }
        Ok(format!("{}:{}", model, prompt))
    }
}
