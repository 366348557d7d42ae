use std::sync::Arc;

use tracing::{debug, warn};

use crate::protocol::{Chunk, TraceError};
use crate::registry::ObjectRegistry;
use crate::view::View;

use super::checkpoint::Checkpoints;

/// A command that failed, aborting the rest of its chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    /// Index of the chunk in the loaded stream.
    pub chunk: usize,
    /// Index of the failing command within the chunk.
    pub command: usize,
    pub key: Option<String>,
    pub method: String,
    pub error: TraceError,
}

/// Outcome of one cursor move. Failures never undo chunks applied before
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: usize,
    pub rebuilt: bool,
    pub failures: Vec<ChunkFailure>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the registry and moves it between cursor positions.
///
/// Cursor `c` means chunks `[0, c)` have been applied; 0 is the empty state.
/// A move to `cursor + 1` applies a single chunk. Any other move clears the
/// registry and replays from the nearest checkpoint (or from zero).
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    chunks: Arc<[Chunk]>,
    cursor: usize,
    registry: ObjectRegistry,
    checkpoints: Checkpoints,
    /// Set by user-driven mutations that commands did not produce.
    diverged: bool,
}

impl ReplayEngine {
    pub fn new(checkpoint_interval: usize) -> Self {
        Self {
            checkpoints: Checkpoints::new(checkpoint_interval),
            ..Self::default()
        }
    }

    /// Replace the chunk stream and return to cursor 0.
    pub fn load(&mut self, chunks: impl Into<Arc<[Chunk]>>) {
        self.chunks = chunks.into();
        self.checkpoints.clear();
        self.reset();
    }

    /// Back to cursor 0 with an empty registry, keeping the chunks.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.registry.clear();
        self.diverged = false;
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn checkpoints(&self) -> &Checkpoints {
        &self.checkpoints
    }

    /// Line number of the last applied chunk.
    pub fn line_indicator(&self) -> Option<u32> {
        self.cursor
            .checked_sub(1)
            .and_then(|last| self.chunks.get(last))
            .and_then(|chunk| chunk.line_number)
    }

    pub fn render_root(&self) -> Option<View> {
        self.registry.render_root()
    }

    /// Move to `target`, stepping incrementally when it is the next position.
    pub fn move_to(&mut self, target: usize) -> Result<ApplyReport, TraceError> {
        self.check_range(target)?;
        if target == self.cursor {
            return Ok(ApplyReport::default());
        }
        if target == self.cursor + 1 {
            return Ok(self.step());
        }
        Ok(self.rebuild(target))
    }

    /// Apply the next chunk.
    pub fn step_forward(&mut self) -> Result<ApplyReport, TraceError> {
        self.check_range(self.cursor + 1)?;
        Ok(self.step())
    }

    /// Rebuild at `target` regardless of the current position.
    pub fn seek(&mut self, target: usize) -> Result<ApplyReport, TraceError> {
        self.check_range(target)?;
        Ok(self.rebuild(target))
    }

    /// Drag-resize a layout in the live registry.
    pub fn resize(&mut self, key: &str, weights: Vec<f64>) -> Result<(), TraceError> {
        self.registry.resize(key, weights)?;
        self.diverged = true;
        Ok(())
    }

    fn check_range(&self, target: usize) -> Result<(), TraceError> {
        if target > self.chunks.len() {
            return Err(TraceError::index(format!(
                "cursor {target} is out of range 0..={}",
                self.chunks.len()
            )));
        }
        Ok(())
    }

    fn step(&mut self) -> ApplyReport {
        let mut report = ApplyReport::default();
        self.apply_chunk(self.cursor, &mut report);
        self.cursor += 1;
        self.save_checkpoint();
        report
    }

    fn rebuild(&mut self, target: usize) -> ApplyReport {
        let mut report = ApplyReport {
            rebuilt: true,
            ..ApplyReport::default()
        };
        self.diverged = false;
        match self.checkpoints.nearest(target) {
            Some((at, snapshot)) => {
                self.registry = snapshot.clone();
                self.cursor = at;
            }
            None => {
                self.registry.clear();
                self.cursor = 0;
            }
        }
        debug!(from = self.cursor, target, "Rebuilding registry");
        while self.cursor < target {
            self.apply_chunk(self.cursor, &mut report);
            self.cursor += 1;
            self.save_checkpoint();
        }
        report
    }

    fn save_checkpoint(&mut self) {
        if !self.diverged {
            self.checkpoints.record(self.cursor, &self.registry);
        }
    }

    fn apply_chunk(&mut self, index: usize, report: &mut ApplyReport) {
        let chunks = Arc::clone(&self.chunks);
        let Some(chunk) = chunks.get(index) else {
            return;
        };
        debug!(
            chunk = index,
            commands = chunk.commands.len(),
            "Applying chunk"
        );
        report.applied += 1;
        for (position, command) in chunk.commands.iter().enumerate() {
            if let Err(error) = self.registry.apply(command) {
                warn!(
                    chunk = index,
                    command = position,
                    method = %command.method,
                    error = %error,
                    "Command failed; skipping rest of chunk"
                );
                report.failures.push(ChunkFailure {
                    chunk: index,
                    command: position,
                    key: command.key.clone(),
                    method: command.method.clone(),
                    error,
                });
                break;
            }
        }
    }
}
