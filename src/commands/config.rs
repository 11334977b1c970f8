//! Config subcommands handler

use anyhow::{Context, Result};

use vlmweave::Config;

/// Show the effective configuration (file plus environment) as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = Config::load_with_env()?;
    let toml_str =
        toml::to_string_pretty(&config.redacted()).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

/// Print the config file path.
#[cfg(not(tarpaulin_include))]
pub fn handle_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Write a default config file unless one already exists.
#[cfg(not(tarpaulin_include))]
pub fn handle_init() -> Result<()> {
    let path = Config::config_path()?;
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    let path = Config::default().save()?;
    println!("Wrote {}", path.display());
    Ok(())
}
