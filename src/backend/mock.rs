//! Mock backend for deterministic testing
//!
//! Returns a pre-configured command stream (or error) without running any
//! interpreter, and records every source it was asked to trace.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::protocol::{Command, TraceError};

use super::{SourceFile, TraceBackend};

#[derive(Clone, Default)]
pub struct MockBackend {
    commands: Vec<Command>,
    error: Option<TraceError>,
    /// Simulated build latency
    delay: Duration,
    captured_sources: Arc<Mutex<Vec<SourceFile>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands returned by every build
    pub fn with_commands(mut self, commands: Vec<Command>) -> Self {
        self.commands = commands;
        self
    }

    /// Fail every build with `error`
    pub fn failing(mut self, error: TraceError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sources passed to `trace`, oldest first
    pub fn captured_sources(&self) -> Vec<SourceFile> {
        self.captured_sources.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_sources.lock().len()
    }
}

#[async_trait]
impl TraceBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn trace(&self, source: &SourceFile) -> Result<Vec<Command>, TraceError> {
        self.captured_sources.lock().push(source.clone());

        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }

        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.commands.clone()),
        }
    }
}
