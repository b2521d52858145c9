//! Configuration management for the gochat client.

use crate::error::Result;
use crate::platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Avatar bound to every anonymous session.
pub const DEFAULT_AVATAR_URL: &str = "https://placeimg.com/140/140/any";

/// Key under which the timeline snapshot is stored.
pub const DEFAULT_CACHE_KEY: &str = "messages";

/// Address dialled by the TCP connectivity probe.
pub const DEFAULT_PROBE_ADDR: &str = "1.1.1.1:53";

const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Display name entered on the start screen.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Avatar URL attached to the session author.
    #[serde(default = "default_avatar_url")]
    pub avatar_url: String,

    /// Key of the serialized timeline in the local store.
    #[serde(default = "default_cache_key")]
    pub cache_key: String,

    /// Directory holding the local cache database.
    #[serde(default = "platform::data_dir")]
    pub data_dir: PathBuf,

    /// Directory the filesystem blob store writes to.
    #[serde(default = "platform::default_blob_dir")]
    pub blob_dir: PathBuf,

    /// `host:port` dialled to decide between live and cached mode.
    #[serde(default = "default_probe_addr")]
    pub probe_addr: String,

    /// Connect timeout for the probe, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_avatar_url() -> String {
    DEFAULT_AVATAR_URL.to_string()
}

fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_string()
}

fn default_probe_addr() -> String {
    DEFAULT_PROBE_ADDR.to_string()
}

fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_name: None,
            avatar_url: default_avatar_url(),
            cache_key: default_cache_key(),
            data_dir: platform::data_dir(),
            blob_dir: platform::default_blob_dir(),
            probe_addr: default_probe_addr(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    pub fn load() -> Result<Self> {
        Self::load_from(&platform::config_file_path())
    }

    /// Load configuration from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let mut config: Config = serde_json::from_str(&contents)?;
            config.fix_invalid_values();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Fix any invalid or empty values with sensible defaults.
    fn fix_invalid_values(&mut self) {
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = platform::data_dir();
        }
        if self.blob_dir.as_os_str().is_empty() {
            self.blob_dir = platform::default_blob_dir();
        }
        if self.cache_key.trim().is_empty() {
            self.cache_key = default_cache_key();
        }
        if self.avatar_url.trim().is_empty() {
            self.avatar_url = default_avatar_url();
        }
        if self.probe_addr.trim().is_empty() {
            self.probe_addr = default_probe_addr();
        }
        if self.probe_timeout_ms == 0 {
            self.probe_timeout_ms = DEFAULT_PROBE_TIMEOUT_MS;
        }
        if matches!(&self.display_name, Some(name) if name.trim().is_empty()) {
            self.display_name = None;
        }
    }

    /// Save configuration to the default config file.
    pub fn save(&mut self) -> Result<()> {
        let path = platform::config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific file.
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        self.fix_invalid_values();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Load configuration from environment variables, falling back to file/defaults.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("GOCHAT_NAME") {
            if !name.trim().is_empty() {
                self.display_name = Some(name);
            }
        }

        if let Ok(dir) = std::env::var("GOCHAT_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(&dir);
                self.blob_dir = PathBuf::from(dir).join("blobs");
            }
        }
    }

    /// Probe connect timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Display name to bind to the session, or a generic fallback.
    pub fn display_name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Anonymous")
    }
}
