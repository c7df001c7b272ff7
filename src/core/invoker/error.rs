//! Model invocation errors

/// Failure of a single model call
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvocationError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Model '{model}' timed out after {timeout_secs}s")]
    Timeout { model: String, timeout_secs: u64 },

    #[error("HTTP error calling model '{model}': {message}")]
    Http { model: String, message: String },

    #[error("Model '{model}' backend returned {status}: {message}")]
    Backend {
        model: String,
        status: u16,
        message: String,
    },

    #[error("Model '{model}' returned an empty response")]
    EmptyResponse { model: String },
}

impl InvocationError {
    pub fn unknown_model(model: impl Into<String>) -> Self {
        Self::UnknownModel(model.into())
    }

    pub fn timeout(model: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            model: model.into(),
            timeout_secs,
        }
    }

    pub fn http(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn backend(model: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            model: model.into(),
            status,
            message: message.into(),
        }
    }

    pub fn empty_response(model: impl Into<String>) -> Self {
        Self::EmptyResponse {
            model: model.into(),
        }
    }

    /// Model the failure refers to
    pub fn model(&self) -> &str {
        match self {
            Self::UnknownModel(model) => model,
            Self::Timeout { model, .. }
            | Self::Http { model, .. }
            | Self::Backend { model, .. }
            | Self::EmptyResponse { model } => model,
        }
    }

    /// Stable code for API error bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownModel(_) => "UNKNOWN_MODEL",
            Self::Timeout { .. } => "MODEL_TIMEOUT",
            Self::Http { .. } => "MODEL_HTTP_ERROR",
            Self::Backend { .. } => "MODEL_BACKEND_ERROR",
            Self::EmptyResponse { .. } => "MODEL_EMPTY_RESPONSE",
        }
    }

    /// Whether a later attempt could plausibly succeed.
    ///
    /// The consumer retries every failure regardless; this only shapes logging.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UnknownModel(_) => false,
            Self::Backend { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } | Self::Http { .. } | Self::EmptyResponse { .. } => true,
        }
    }
}
