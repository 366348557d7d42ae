pub mod backend;
pub mod config;
pub mod layout;
pub mod player;
pub mod protocol;
pub mod registry;
pub mod replay;
pub mod tracers;
pub mod util;
pub mod view;

pub use backend::{BackendRegistry, SourceFile, TraceBackend};
pub use config::Config;
pub use player::{PlayerHandle, PlayerSnapshot, PlayerState, PlayerTask, PlayerUpdate};
pub use protocol::{chunk_commands, parse_commands, Chunk, Command, TraceError};
pub use registry::ObjectRegistry;
pub use replay::{ApplyReport, ReplayEngine};
pub use view::View;
