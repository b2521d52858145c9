pub mod cache;
pub mod chat;
pub mod config;

use anyhow::Result;
use gochat_core::{platform, Config, Message, SledKeyValueStore};

/// Open the on-disk snapshot store under the configured data directory.
pub fn open_local_store(config: &Config) -> Result<SledKeyValueStore> {
    let path = platform::cache_db_path(&config.data_dir);
    Ok(SledKeyValueStore::open(&path)?)
}

/// One timeline row as printed in the terminal.
pub fn render(message: &Message) -> String {
    let stamp = message.created_at.format("%H:%M");
    let who = &message.author.display_name;

    if let Some(url) = &message.image {
        format!("[{}] {}: [image] {}", stamp, who, url)
    } else if let Some(point) = &message.location {
        format!(
            "[{}] {}: [location] {:.5}, {:.5}",
            stamp, who, point.latitude, point.longitude
        )
    } else {
        format!("[{}] {}: {}", stamp, who, message.text)
    }
}
