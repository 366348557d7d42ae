//! Execution backends that turn a source file into a command stream.

pub mod interpreter;
pub mod mock;
pub mod passthrough;
pub mod remote;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::BackendsConfig;
use crate::protocol::{Command, TraceError};

pub use interpreter::ProcessBackend;
pub use mock::MockBackend;
pub use passthrough::{JsonBackend, MarkdownBackend};
pub use remote::RemoteBackend;

/// A named document handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk, naming it after its file name.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self { name, content })
    }

    pub fn extension(&self) -> Option<&str> {
        extension(&self.name)
    }
}

/// Text after the last `.`, if non-empty.
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Produces the command stream for a source file.
///
/// Dropping the returned future cancels the build.
#[async_trait]
pub trait TraceBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError>;
}

/// Backends keyed by file extension.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn TraceBackend>>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut languages = self.languages();
        languages.sort();
        f.debug_struct("BackendRegistry")
            .field("languages", &languages)
            .finish()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passthrough backends plus the configured interpreters and remote
    /// languages.
    pub fn with_defaults(config: &BackendsConfig) -> Result<Self, TraceError> {
        let mut registry = Self::new();
        registry.register("md", Arc::new(MarkdownBackend));
        registry.register("json", Arc::new(JsonBackend));

        let remote = Arc::new(RemoteBackend::new(
            &config.remote_url,
            config.request_timeout,
        )?);
        for ext in &config.remote_languages {
            registry.register(ext, remote.clone());
        }

        for (ext, interpreter) in &config.interpreters {
            let backend = ProcessBackend::new(
                ext,
                interpreter.command.clone(),
                interpreter.prelude.clone(),
            )?
            .with_timeout(config.request_timeout);
            registry.register(ext, Arc::new(backend));
        }
        Ok(registry)
    }

    pub fn register(&mut self, ext: impl Into<String>, backend: Arc<dyn TraceBackend>) {
        self.backends.insert(ext.into(), backend);
    }

    pub fn get(&self, ext: &str) -> Option<Arc<dyn TraceBackend>> {
        self.backends.get(ext).cloned()
    }

    pub fn languages(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Backend for a file name, by extension.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn TraceBackend>, TraceError> {
        let ext = extension(name).unwrap_or_default();
        self.get(ext)
            .ok_or_else(|| TraceError::UnsupportedLanguage(ext.to_string()))
    }

    pub async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError> {
        let backend = self.resolve(&source.name)?;
        tracing::debug!(file = %source.name, backend = backend.name(), "Tracing source");
        backend.trace(source).await
    }
}
