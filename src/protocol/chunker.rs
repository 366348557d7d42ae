//! Splits a flat command stream into steps at `delay` boundaries.

use serde::Serialize;

use super::command::Command;

/// Commands executed between two consecutive step delimiters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chunk {
    pub commands: Vec<Command>,
    /// Line of the delimiter that closed this chunk. `None` for the trailing chunk.
    pub line_number: Option<u32>,
}

/// Chunk a command stream. The result always holds one more chunk than there
/// are `delay` commands in the input.
pub fn chunk_commands<I>(commands: I) -> Vec<Chunk>
where
    I: IntoIterator<Item = Command>,
{
    let mut chunks = vec![Chunk::default()];
    for command in commands {
        if command.is_delay() {
            let line = command.delay_line();
            if let Some(current) = chunks.last_mut() {
                current.line_number = line;
            }
            chunks.push(Chunk::default());
        } else if let Some(current) = chunks.last_mut() {
            current.commands.push(command);
        }
    }
    tracing::debug!(chunks = chunks.len(), "Chunked command stream");
    chunks
}
