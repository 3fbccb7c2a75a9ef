//! Init and Config commands.

use std::path::PathBuf;

use anyhow::{Context, anyhow};

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(force: bool) -> anyhow::Result<()> {
    let existed = PathBuf::from(".docchat/settings.toml").exists();

    let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
    if existed {
        println!("Overwrote configuration file at: {}", path.display());
    } else {
        println!("Created configuration file at: {}", path.display());
    }
    println!("Edit this file to customize your settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> anyhow::Result<()> {
    let toml_str = toml::to_string_pretty(config).context("failed to render configuration")?;
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{toml_str}");
    Ok(())
}
