//! Cursor-driven replay of chunked trace commands.

pub mod checkpoint;
pub mod engine;

pub use checkpoint::Checkpoints;
pub use engine::{ApplyReport, ChunkFailure, ReplayEngine};
