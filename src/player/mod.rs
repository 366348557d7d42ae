//! Timed playback over the replay engine.

pub mod scheduler;
pub mod task;

pub use scheduler::{
    BuildTicket, PlayerConfig, PlayerState, PlayerUpdate, Scheduler, TimerRequest,
};
pub use task::{PlayerCommand, PlayerHandle, PlayerSnapshot, PlayerTask};
