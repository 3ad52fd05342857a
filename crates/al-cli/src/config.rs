//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use al_core::{InvalidDuration, PlannedMinutes};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Aliman backend.
    pub api_url: String,
    /// Path to the local store holding the saved login.
    pub database_path: PathBuf,
    /// Focus duration used when `--minutes` is not given.
    pub default_minutes: u32,
    /// Delay before checking whether a hide was momentary.
    pub grace_period_ms: u64,
    /// Number of chat messages fetched by `chat history`.
    pub history_limit: u32,
    /// Switch to the terminal's alternate screen during focus sessions.
    pub fullscreen: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            api_url: "http://localhost:8000".to_string(),
            database_path: data_dir.join("aliman.db"),
            default_minutes: PlannedMinutes::default().get(),
            grace_period_ms: 100,
            history_limit: 20,
            fullscreen: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ALIMAN_*)
        figment = figment.merge(Env::prefixed("ALIMAN_"));

        figment.extract()
    }

    /// The configured default focus duration.
    pub fn default_duration(&self) -> Result<PlannedMinutes, InvalidDuration> {
        PlannedMinutes::try_from(self.default_minutes)
    }

    pub const fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// Returns the platform-specific config directory for aliman.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aliman"))
}

/// Returns the platform-specific data directory for aliman.
///
/// On Linux: `~/.local/share/aliman`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("aliman"))
}
