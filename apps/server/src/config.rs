//! Daemon configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/filestat/filestatd.toml`
//! - Windows: `%APPDATA%/filestat/filestatd.toml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory where uploaded files are stored.
    #[serde(default = "default_save_dir")]
    pub save_dir: String,

    /// Path of the shared result log.
    #[serde(default = "default_result_log")]
    pub result_log: String,
}

fn default_port() -> u16 {
    7070
}

fn default_save_dir() -> String {
    "~/.local/share/filestat/uploads".into()
}

fn default_result_log() -> String {
    "~/.local/share/filestat/analysis_result.txt".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            save_dir: default_save_dir(),
            result_log: default_result_log(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("filestat")
            .join("filestatd.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Ok(home_dir()
            .join(".config")
            .join("filestat")
            .join("filestatd.toml"))
    }
}
