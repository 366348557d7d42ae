//! Temporary trace files and data directories

use std::path::{Path, PathBuf};

use stepviz::Command;
use tempfile::TempDir;

/// A temporary directory for trace files plus a private data dir.
///
/// Everything is removed when the `TraceDir` is dropped.
pub struct TraceDir {
    _dir: TempDir,
    /// Root of the temporary directory
    pub path: PathBuf,
}

impl TraceDir {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();
        Self { _dir: dir, path }
    }

    /// Write `content` to `name` and return its path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path.join(name);
        std::fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    /// Serialise `commands` to a `.json` trace file
    pub fn write_trace(&self, name: &str, commands: &[Command]) -> PathBuf {
        let json = serde_json::to_string(commands).expect("Failed to serialise commands");
        self.write(name, &json)
    }

    /// Data directory passed to the CLI with `--data-dir`
    pub fn data_dir(&self) -> PathBuf {
        let dir = self.path.join("data");
        std::fs::create_dir_all(&dir).expect("Failed to create data dir");
        dir
    }

    /// Write a config file into the data dir
    pub fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.data_dir().join("config.toml");
        std::fs::write(&path, toml).expect("Failed to write config");
        path
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path.join(relative).exists()
    }
}

impl Default for TraceDir {
    fn default() -> Self {
        Self::new()
    }
}
