use anyhow::{Context, Result};

use crate::cli::output::OutputOptions;
use crate::core::config::{AppConfig, DEFAULT_CONFIG};

pub fn init(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    std::fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Generated config at {}", path.display());
    println!("  Source mode is \"demo\"; switch to \"http\" once you have an endpoint.");
    Ok(())
}

pub fn check(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        println!("No config file at {}; defaults apply.", path.display());
        return Ok(());
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("Config OK at {}", path.display());
            println!("  source.mode      {}", config.source.mode);
            println!("  cache.ttl        {}s", config.cache.ttl_seconds);
            println!("  default window   {} days", config.output.default_days);
        }
        Err(e) => {
            eprintln!("Config check failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
