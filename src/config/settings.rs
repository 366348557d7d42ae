use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use toml_edit::{DocumentMut, Item, Table};

use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

pub const MIN_SPEED: f64 = 0.0;
pub const MAX_SPEED: f64 = 4.0;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub backends: BackendsConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Step interval at speed 0
    pub base_interval: Duration,
    /// Initial speed, within [MIN_SPEED, MAX_SPEED]
    pub speed: f64,
    /// Registry snapshot spacing in steps; 0 disables
    pub checkpoint_interval: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendsConfig {
    /// Base URL of the compile-and-trace service
    pub remote_url: String,
    /// Extensions traced by the remote service
    pub remote_languages: Vec<String>,
    pub request_timeout: Duration,
    /// Local interpreters keyed by extension
    pub interpreters: HashMap<String, InterpreterConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterpreterConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Script prepended to the user's code
    #[serde(default)]
    pub prelude: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(4000),
            speed: 2.0,
            checkpoint_interval: 0,
        }
    }
}

impl Default for BackendsConfig {
    /// No local interpreters: each one needs a runner script configured.
    fn default() -> Self {
        Self {
            remote_url: "https://algorithm-visualizer.org/api".to_string(),
            remote_languages: vec!["cpp".to_string(), "java".to_string()],
            request_timeout: Duration::from_secs(30),
            interpreters: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlPlaybackConfig {
    pub base_interval_ms: Option<u64>,
    pub speed: Option<f64>,
    pub checkpoint_interval: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlBackendsConfig {
    pub remote_url: Option<String>,
    pub remote_languages: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
    pub interpreters: Option<HashMap<String, InterpreterConfig>>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub playback: Option<TomlPlaybackConfig>,
    pub backends: Option<TomlBackendsConfig>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load from an explicit path. Unreadable or malformed files yield the
    /// defaults.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let Ok(contents) = fs::read_to_string(path) else {
            return config;
        };
        let toml_config = match toml::from_str::<TomlConfig>(&contents) {
            Ok(toml_config) => toml_config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config");
                return config;
            }
        };

        if let Some(playback) = toml_config.playback {
            if let Some(ms) = playback.base_interval_ms {
                config.playback.base_interval = Duration::from_millis(ms);
            }
            if let Some(speed) = playback.speed {
                config.playback.speed = clamp_speed(speed);
            }
            if let Some(interval) = playback.checkpoint_interval {
                config.playback.checkpoint_interval = interval;
            }
        }

        if let Some(backends) = toml_config.backends {
            if let Some(url) = backends.remote_url {
                config.backends.remote_url = url.trim_end_matches('/').to_string();
            }
            if let Some(languages) = backends.remote_languages {
                config.backends.remote_languages = languages;
            }
            if let Some(secs) = backends.request_timeout_secs {
                config.backends.request_timeout = Duration::from_secs(secs);
            }
            // Per-extension entries override the defaults; others are kept.
            if let Some(interpreters) = backends.interpreters {
                for (ext, interpreter) in interpreters {
                    if interpreter.command.is_empty() {
                        tracing::warn!(ext = %ext, "Ignoring interpreter with empty command");
                        continue;
                    }
                    config.backends.interpreters.insert(ext, interpreter);
                }
            }
        }

        config
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &PathBuf) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }
}

pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return PlaybackConfig::default().speed;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Save the playback speed to the config file.
pub fn save_speed(speed: f64) -> std::io::Result<()> {
    save_speed_to(&config_path(), speed)
}

/// Update `[playback] speed` in the file at `config_file`, preserving all
/// other content.
pub fn save_speed_to(config_file: &Path, speed: f64) -> std::io::Result<()> {
    let contents = if config_file.exists() {
        fs::read_to_string(config_file)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = contents
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if !doc.contains_key("playback") {
        doc["playback"] = Item::Table(Table::new());
    }
    doc["playback"]["speed"] = toml_edit::value(clamp_speed(speed));

    if let Some(parent) = config_file.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(config_file, doc.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.playback.base_interval, Duration::from_millis(4000));
        assert!(config.backends.interpreters.is_empty());
    }

    #[test]
    fn example_config_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, EXAMPLE_CONFIG).unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[playback]
speed = 9.5
checkpoint_interval = 16

[backends]
remote_url = "http://localhost:8080/api/"

[backends.interpreters.py]
command = ["python3", "runner.py"]
"#,
        )
        .unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.playback.speed, MAX_SPEED);
        assert_eq!(config.playback.checkpoint_interval, 16);
        assert_eq!(config.playback.base_interval, Duration::from_millis(4000));
        assert_eq!(config.backends.remote_url, "http://localhost:8080/api");
        assert_eq!(config.backends.interpreters["py"].command[0], "python3");
        assert_eq!(config.backends.interpreters.len(), 1);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[playback\nspeed = ").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn save_speed_preserves_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "# keep me\n[backends]\nremote_url = \"http://x\"\n",
        )
        .unwrap();
        save_speed_to(&path, 3.0).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("# keep me"));
        let config = Config::load_from(&path);
        assert_eq!(config.playback.speed, 3.0);
        assert_eq!(config.backends.remote_url, "http://x");
    }
}
