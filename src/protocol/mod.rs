//! Trace command protocol: the wire format every backend emits.

pub mod chunker;
pub mod command;
pub mod error;

pub use chunker::{chunk_commands, Chunk};
pub use command::{parse_commands, Command, DELAY, DESTROY, SET_ROOT};
pub use error::TraceError;
