//! Cache command - inspect or clear the offline snapshot.

use anyhow::Result;
use gochat_core::{Config, LocalCache};
use std::sync::Arc;

use super::{open_local_store, render};

async fn open_cache() -> Result<LocalCache> {
    let config = Config::load_with_env()?;
    let store = open_local_store(&config)?;
    Ok(LocalCache::new(Arc::new(store), config.cache_key))
}

pub async fn show() -> Result<()> {
    let cache = open_cache().await?;
    let timeline = cache.load().await;

    if timeline.is_empty() {
        println!("No cached messages");
        return Ok(());
    }

    println!("Cached messages ({})", timeline.len());
    println!("===============");
    for message in timeline.iter().rev() {
        println!("{}", render(message));
    }

    Ok(())
}

pub async fn clear() -> Result<()> {
    let cache = open_cache().await?;
    cache.clear().await;
    println!("Cleared cached snapshot '{}'", cache.key());
    Ok(())
}
