mod settings;

pub use settings::{
    clamp_speed, save_speed, save_speed_to, BackendsConfig, Config, InterpreterConfig,
    PlaybackConfig, EXAMPLE_CONFIG, MAX_SPEED, MIN_SPEED,
};
