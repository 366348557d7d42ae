//! Path utilities for stepviz data directories

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global storage for custom data directory path
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the data directory with an optional custom path.
/// Must be called early in main() before any other path functions are used.
/// If custom_path is None, uses the default ~/.stepviz location.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if DATA_DIR.set(path.clone()).is_err() {
        let existing = DATA_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Data directory already initialized"
        );
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".stepviz"))
        .unwrap_or_else(|| PathBuf::from(".stepviz"))
}

/// Base data directory: the custom path if set via init_data_dir(), otherwise ~/.stepviz
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// ~/.stepviz/logs
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// ~/.stepviz/logs/stepviz.log
pub fn log_file_path() -> PathBuf {
    logs_dir().join("stepviz.log")
}

/// ~/.stepviz/config.toml
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
