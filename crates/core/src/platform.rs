//! Cross-platform utilities.

use std::path::PathBuf;

/// Get the application data directory.
///
/// - Linux: `~/.local/share/gochat`
/// - Windows: `%LOCALAPPDATA%\gochat`
/// - macOS: `~/Library/Application Support/gochat`
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gochat")
}

/// Get the configuration directory.
///
/// - Linux: `~/.config/gochat`
/// - Windows: `%APPDATA%\gochat`
/// - macOS: `~/Library/Application Support/gochat`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gochat")
}

/// Get the path to the main config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Get the path to the local cache database under a data directory.
pub fn cache_db_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("cache.db")
}

/// Get the default directory for uploaded blobs.
pub fn default_blob_dir() -> PathBuf {
    data_dir().join("blobs")
}
