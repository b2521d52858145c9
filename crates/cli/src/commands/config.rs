//! Config command - view or modify configuration.

use anyhow::Result;
use gochat_core::Config;

pub async fn execute(key: Option<String>, value: Option<String>) -> Result<()> {
    let mut config = Config::load_with_env()?;

    match (key.as_deref(), value) {
        (None, None) => {
            println!("Current Configuration");
            println!("=====================");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        (Some(key), None) => match key {
            "display_name" => println!("{:?}", config.display_name),
            "avatar_url" => println!("{}", config.avatar_url),
            "cache_key" => println!("{}", config.cache_key),
            "data_dir" => println!("{:?}", config.data_dir),
            "blob_dir" => println!("{:?}", config.blob_dir),
            "probe_addr" => println!("{}", config.probe_addr),
            "probe_timeout_ms" => println!("{}", config.probe_timeout_ms),
            _ => println!("Unknown config key: {}", key),
        },
        (Some(key), Some(value)) => {
            match key {
                "display_name" => {
                    config.display_name = if value.trim().is_empty() {
                        None
                    } else {
                        Some(value)
                    };
                }
                "avatar_url" => config.avatar_url = value,
                "cache_key" => config.cache_key = value,
                "data_dir" => config.data_dir = value.into(),
                "blob_dir" => config.blob_dir = value.into(),
                "probe_addr" => config.probe_addr = value,
                "probe_timeout_ms" => match value.parse() {
                    Ok(ms) => config.probe_timeout_ms = ms,
                    Err(_) => {
                        println!("probe_timeout_ms must be a number of milliseconds");
                        return Ok(());
                    }
                },
                _ => {
                    println!("Cannot set config key: {}", key);
                    return Ok(());
                }
            }
            config.save()?;
            println!("Set {}", key);
        }
        (None, Some(_)) => {
            println!("Must specify a key to set a value");
        }
    }

    Ok(())
}
