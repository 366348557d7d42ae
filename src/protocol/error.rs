use thiserror::Error;

/// Failures raised while building or replaying a trace.
///
/// Only `Build` and `UnsupportedLanguage` come from backends; the rest are
/// raised while applying commands and abort the remainder of the chunk being
/// applied.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TraceError {
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Invalid argument for '{method}': {message}")]
    Argument { method: String, message: String },
    #[error("Index error: {0}")]
    Index(String),
    #[error("Build failed: {0}")]
    Build(String),
    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),
    #[error("Build cancelled")]
    Cancelled,
}

impl TraceError {
    pub fn protocol(message: impl Into<String>) -> Self {
        TraceError::Protocol(message.into())
    }

    pub fn index(message: impl Into<String>) -> Self {
        TraceError::Index(message.into())
    }

    pub fn argument(method: &str, message: impl Into<String>) -> Self {
        TraceError::Argument {
            method: method.to_string(),
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        TraceError::Build(message.into())
    }

    /// Superseded builds are dropped quietly.
    pub fn is_silent(&self) -> bool {
        matches!(self, TraceError::Cancelled)
    }
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        TraceError::Build(format!("invalid command stream: {err}"))
    }
}
